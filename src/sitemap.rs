//! Build-time `sitemap.xml` generation for the site's routes.

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::fs;
use std::io::{self, Cursor};
use std::path::Path;

/// Hostname used when `SITE_URL` is unset.
pub const DEFAULT_HOSTNAME: &str = "https://www.sydsolutiontech.me";

/// Where the page application serves static files from.
pub const DEFAULT_OUTPUT: &str = "public/sitemap.xml";

/// Every route the page application defines.
pub const ROUTES: [&str; 6] = [
    "/",
    "/services",
    "/portfolio",
    "/about",
    "/feedbacks",
    "/contact",
];

const SITEMAP_NS: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";

/// A sitemaps.org `urlset` for one host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sitemap {
    hostname: String,
    routes: Vec<String>,
}

impl Sitemap {
    /// Sitemap for `hostname` covering [`ROUTES`].
    pub fn new(hostname: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into().trim_end_matches('/').to_string(),
            routes: ROUTES.iter().map(|r| r.to_string()).collect(),
        }
    }

    /// Replace the route list.
    pub fn routes<I, S>(mut self, routes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.routes = routes.into_iter().map(Into::into).collect();
        self
    }

    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    /// Absolute URL for each route, in order.
    pub fn urls(&self) -> Vec<String> {
        self.routes
            .iter()
            .map(|route| {
                let route = route.trim_start_matches('/');
                format!("{}/{}", self.hostname, route)
            })
            .collect()
    }

    /// Render the XML document.
    pub fn render(&self) -> io::Result<String> {
        let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);

        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
            .map_err(xml_error)?;

        let mut urlset = BytesStart::new("urlset");
        urlset.push_attribute(("xmlns", SITEMAP_NS));
        writer
            .write_event(Event::Start(urlset))
            .map_err(xml_error)?;

        for url in self.urls() {
            writer
                .write_event(Event::Start(BytesStart::new("url")))
                .map_err(xml_error)?;
            writer
                .write_event(Event::Start(BytesStart::new("loc")))
                .map_err(xml_error)?;
            writer
                .write_event(Event::Text(BytesText::new(&url)))
                .map_err(xml_error)?;
            writer
                .write_event(Event::End(BytesEnd::new("loc")))
                .map_err(xml_error)?;
            writer
                .write_event(Event::End(BytesEnd::new("url")))
                .map_err(xml_error)?;
        }

        writer
            .write_event(Event::End(BytesEnd::new("urlset")))
            .map_err(xml_error)?;

        let mut xml = String::from_utf8(writer.into_inner().into_inner())
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        xml.push('\n');
        Ok(xml)
    }

    /// Render and write to `path`, creating parent directories.
    pub fn write_to(&self, path: impl AsRef<Path>) -> io::Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.render()?)?;
        tracing::info!(path = %path.display(), hostname = %self.hostname, "sitemap.xml generated");
        Ok(())
    }
}

impl Default for Sitemap {
    fn default() -> Self {
        Self::new(DEFAULT_HOSTNAME)
    }
}

fn xml_error(e: impl std::fmt::Display) -> io::Error {
    io::Error::other(format!("sitemap serialization failed: {}", e))
}
