//! Writing sitemap.xml to disk.

use contact_relay::sitemap::{Sitemap, DEFAULT_OUTPUT, ROUTES};

#[test]
fn write_creates_parent_directories() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(DEFAULT_OUTPUT);
    assert!(!path.parent().unwrap().exists());

    Sitemap::new("https://www.example.com").write_to(&path).unwrap();

    let xml = std::fs::read_to_string(&path).unwrap();
    for route in ROUTES {
        let loc = format!("<loc>https://www.example.com{}</loc>", route);
        assert!(xml.contains(&loc), "missing {loc}");
    }
    assert_eq!(xml.matches("<url>").count(), ROUTES.len());
}

#[test]
fn write_overwrites_previous_output() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sitemap.xml");
    std::fs::write(&path, "stale").unwrap();

    Sitemap::new("https://a.example").routes(["/"]).write_to(&path).unwrap();

    let xml = std::fs::read_to_string(&path).unwrap();
    assert!(!xml.contains("stale"));
    assert!(xml.contains("<loc>https://a.example/</loc>"));
}

#[test]
fn write_into_a_file_path_fails() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("public");
    std::fs::write(&blocker, "not a directory").unwrap();

    let result = Sitemap::default().write_to(blocker.join("sitemap.xml"));
    assert!(result.is_err());
}
