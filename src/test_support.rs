//! Local HTTP fixtures for module tests

use axum::Router;
use tokio::net::TcpListener;

/// Serve `app` on an ephemeral localhost port and return its base URL
pub(crate) async fn serve(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

pub(crate) const SEARCH_PAGE: &str = r#"
<html>
<body>
    <div class="h-[125] flex flex-col justify-center">
        <div class="relative top-[-10]">
            <h3 class="text-xl font-bold">
                <a href="/md5/123456" class="js-vim-focus custom-a">Test Book Title</a>
            </h3>
            <div class="text-sm">
                Test Author [en], epub, 1.2MB, 2023
            </div>
        </div>
    </div>
    <div class="h-[125] flex flex-col justify-center">
        <div class="relative top-[-10]">
            <h3 class="text-xl font-bold">
                <a href="/md5/789012" class="js-vim-focus custom-a">Another Book</a>
            </h3>
            <div class="text-sm">
                Another Author [fr], pdf, 2.5MB, 2022
            </div>
        </div>
    </div>
</body>
</html>
"#;

pub(crate) const DETAIL_PAGE: &str = r#"
<html>
<body>
    <div id="external-downloads">
        <a href="http://libgen.rs/book/123456">Libgen.rs</a>
        <a href="http://example.com/download">Direct Download</a>
    </div>
</body>
</html>
"#;
