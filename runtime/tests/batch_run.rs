//! Batch runs over catalog directories.

mod common;

use common::*;
use geothumb::catalog::{load_catalog, run_batch, ThumbnailGenerator};

#[tokio::test]
async fn test_batch_over_directory() {
    let server = stub_server().await;
    mount_boundary(&server, "TLS", TLS_BOUNDARY, 1).await;
    mount_geojson(&server, "/data.geojson", FACILITIES, 1).await;

    let catalog = tempfile::tempdir().unwrap();
    std::fs::write(
        catalog.path().join("x1.yml"),
        "id: x1\ncountry-region: timor-leste\nlinks: []\n",
    )
    .unwrap();
    std::fs::write(
        catalog.path().join("x2.json"),
        format!(
            r#"{{"id": "x2", "links": [{{"type": "geojson", "url": "{}/data.geojson"}}]}}"#,
            server.uri()
        ),
    )
    .unwrap();
    std::fs::write(catalog.path().join("x3.yml"), "id: x3\nlinks: []\n").unwrap();
    std::fs::write(catalog.path().join("x4.yml"), "id: [not closed\n").unwrap();
    std::fs::write(catalog.path().join("README.md"), "not a catalog file").unwrap();

    // Output directory does not exist yet.
    let out = tempfile::tempdir().unwrap();
    let output_dir = out.path().join("thumbs");

    let generator = ThumbnailGenerator::from_settings(&settings_for(&server)).unwrap();
    let entries = load_catalog(&[catalog.path().to_path_buf()]).unwrap();
    assert_eq!(entries.len(), 4);

    let report = run_batch(&generator, entries, &small_args(), &output_dir)
        .await
        .unwrap();

    assert_eq!(
        report.generated,
        vec![output_dir.join("x1.png"), output_dir.join("x2.png")]
    );
    assert_eq!(report.skipped, vec!["x3".to_string()]);
    assert_eq!(report.failed.len(), 1);
    assert!(report.failed[0].source.ends_with("x4.yml"));
    assert!(report.has_failures());
    assert_eq!(report.total(), 4);

    let mut written: Vec<_> = std::fs::read_dir(&output_dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    written.sort();
    assert_eq!(written, vec!["x1.png", "x2.png"]);
}

#[tokio::test]
async fn test_batch_continues_after_render_failure() {
    let server = stub_server().await;
    mount_geojson(&server, "/data.geojson", FACILITIES, 1).await;

    let catalog = tempfile::tempdir().unwrap();
    let bad = catalog.path().join("bad.yml");
    let good = catalog.path().join("good.yml");
    let link = format!("links:\n  - type: geojson\n    url: {}/data.geojson\n", server.uri());
    std::fs::write(&bad, format!("id: ../escape\n{link}")).unwrap();
    std::fs::write(&good, format!("id: good\n{link}")).unwrap();

    let out = tempfile::tempdir().unwrap();
    let generator = ThumbnailGenerator::from_settings(&settings_for(&server)).unwrap();
    let entries = load_catalog(&[bad, good]).unwrap();
    let report = run_batch(&generator, entries, &small_args(), out.path())
        .await
        .unwrap();

    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].source, "../escape");
    assert_eq!(report.generated, vec![out.path().join("good.png")]);
}
