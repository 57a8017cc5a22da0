//! End-to-end conversions. These drive a real Chrome/Chromium and are ignored
//! by default; run them with `cargo test -p html2pdf-render -- --ignored`.

use html2pdf_render::{ConversionRequest, PdfOptions, RenderOptions, Renderer, WaitUntil};
use regex::bytes::Regex;
use std::path::Path;

fn renderer() -> Renderer {
    Renderer::new().expect("Chrome/Chromium must be installed to run end-to-end tests")
}

fn page_count(pdf: &Path) -> usize {
    let bytes = std::fs::read(pdf).unwrap();
    assert!(bytes.starts_with(b"%PDF-"));
    Regex::new(r"/Type\s*/Page[^s]").unwrap().find_iter(&bytes).count()
}

/// Width and height in points of every page's media box.
fn media_boxes(pdf: &Path) -> Vec<(f64, f64)> {
    let bytes = std::fs::read(pdf).unwrap();
    let number = r"(-?[0-9]+(?:\.[0-9]+)?)";
    let pattern = format!(r"/MediaBox\s*\[\s*{number}\s+{number}\s+{number}\s+{number}\s*\]");
    Regex::new(&pattern)
        .unwrap()
        .captures_iter(&bytes)
        .map(|caps| {
            let value = |i: usize| std::str::from_utf8(&caps[i]).unwrap().parse::<f64>().unwrap();
            (value(3) - value(1), value(4) - value(2))
        })
        .collect()
}

#[tokio::test]
#[ignore = "requires Chrome/Chromium"]
async fn inline_html_with_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("out.pdf");
    let request = ConversionRequest::from_html("<html><body><h1>Hi</h1></body></html>", &output);

    let result = renderer().convert(&request, &PdfOptions::default(), &RenderOptions::default()).await.unwrap();

    assert_eq!(result, output);
    assert_eq!(page_count(&result), 1);
    // A4 is 8.27in x 11.7in, i.e. 595.44pt x 842.4pt.
    let boxes = media_boxes(&result);
    assert!(!boxes.is_empty());
    for (width, height) in boxes {
        assert!((width - 595.44).abs() < 2.0, "page width {width}pt is not A4");
        assert!((height - 842.4).abs() < 2.0, "page height {height}pt is not A4");
    }
}

#[tokio::test]
#[ignore = "requires Chrome/Chromium"]
async fn file_with_relative_resources_and_nested_output() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("style.css"), "h1 { color: teal }").unwrap();
    let html_path = dir.path().join("page.html");
    std::fs::write(
        &html_path,
        r#"<html><head><link rel="stylesheet" href="style.css"></head><body><h1>Hi</h1></body></html>"#,
    )
    .unwrap();
    let output = dir.path().join("a/b/out.pdf");
    let request = ConversionRequest::from_file(&html_path, &output);
    let pdf = PdfOptions::default().with_header_footer("", html2pdf_render::templates::default_footer().unwrap());
    let render = RenderOptions { wait_until: WaitUntil::Load, ..Default::default() };

    let result = renderer().convert(&request, &pdf, &render).await.unwrap();

    assert_eq!(result, output);
    assert!(output.exists());
}

#[tokio::test]
#[ignore = "requires Chrome/Chromium"]
async fn remote_resources_are_dropped_without_network() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("out.pdf");
    let html = r#"<html><head>
        <link rel="stylesheet" href="https://fonts.googleapis.com/css2?family=Inter">
        <script src="https://example.com/analytics.js"></script>
        </head><body><img src="https://example.com/logo.png"><p>Offline</p></body></html>"#;
    let request = ConversionRequest::from_html(html, &output);
    let render = RenderOptions { allow_network: false, ..Default::default() };

    let result = renderer().convert(&request, &PdfOptions::default(), &render).await.unwrap();

    assert!(result.exists());
}
