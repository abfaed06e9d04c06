//! MIME type detection utilities.
//!
//! `guess` is the only entry point the server uses: an extension table with
//! a four-case fallback for names the table does not know.

/// Common MIME type constants.
pub mod types {
    // Text
    pub const HTML: &str = "text/html; charset=utf-8";
    pub const PLAIN: &str = "text/plain; charset=utf-8";
    pub const JSON: &str = "application/json";
    pub const XML: &str = "application/xml";
    pub const MARKDOWN: &str = "text/markdown; charset=utf-8";
    pub const CSV: &str = "text/csv; charset=utf-8";

    // Fallbacks for the web trio
    pub const FALLBACK_JS: &str = "application/javascript";
    pub const FALLBACK_CSS: &str = "text/css";
    pub const FALLBACK_HTML: &str = "text/html";
    pub const FALLBACK_TEXT: &str = "text/plain";

    // Binary
    pub const WASM: &str = "application/wasm";
    pub const PDF: &str = "application/pdf";
    pub const ZIP: &str = "application/zip";

    // Images
    pub const PNG: &str = "image/png";
    pub const JPEG: &str = "image/jpeg";
    pub const GIF: &str = "image/gif";
    pub const WEBP: &str = "image/webp";
    pub const AVIF: &str = "image/avif";
    pub const SVG: &str = "image/svg+xml";
    pub const ICO: &str = "image/x-icon";

    // Audio / Video
    pub const MP3: &str = "audio/mpeg";
    pub const WAV: &str = "audio/wav";
    pub const OGG_AUDIO: &str = "audio/ogg";
    pub const MP4: &str = "video/mp4";
    pub const WEBM: &str = "video/webm";

    // Fonts
    pub const WOFF: &str = "font/woff";
    pub const WOFF2: &str = "font/woff2";
    pub const TTF: &str = "font/ttf";
    pub const OTF: &str = "font/otf";
}

/// Guess the MIME type of a served item from its name.
///
/// Known extensions come from the table; anything else falls back to
/// `application/javascript` for `.js`, `text/css` for `.css`, `text/html`
/// for `.html`/`.htm`, and `text/plain` otherwise.
pub fn guess(name: &str) -> &'static str {
    let ext = extension(name);
    from_extension(ext.as_deref()).unwrap_or_else(|| fallback(ext.as_deref()))
}

/// Lowercased extension of a name, if any: `Site.CSS` and `.css` both give
/// `css`, `trailing.` gives none.
pub fn extension(name: &str) -> Option<String> {
    let file = name.rsplit('/').next().unwrap_or(name);
    let (_, ext) = file.rsplit_once('.')?;
    if ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// Look up an extension in the table.
///
/// The web trio is deliberately absent so `fallback` decides it.
fn from_extension(ext: Option<&str>) -> Option<&'static str> {
    let mime = match ext? {
        "mjs" | "cjs" => types::FALLBACK_JS,
        "json" | "map" => types::JSON,
        "xml" => types::XML,
        "md" => types::MARKDOWN,
        "csv" => types::CSV,
        "txt" => types::PLAIN,

        "svg" => types::SVG,
        "png" => types::PNG,
        "jpg" | "jpeg" => types::JPEG,
        "gif" => types::GIF,
        "webp" => types::WEBP,
        "avif" => types::AVIF,
        "ico" => types::ICO,

        "mp3" => types::MP3,
        "wav" => types::WAV,
        "ogg" | "oga" => types::OGG_AUDIO,
        "mp4" | "m4v" => types::MP4,
        "webm" => types::WEBM,

        "woff" => types::WOFF,
        "woff2" => types::WOFF2,
        "ttf" => types::TTF,
        "otf" => types::OTF,

        "wasm" => types::WASM,
        "pdf" => types::PDF,
        "zip" => types::ZIP,
        _ => return None,
    };
    Some(mime)
}

fn fallback(ext: Option<&str>) -> &'static str {
    match ext {
        Some("js") => types::FALLBACK_JS,
        Some("css") => types::FALLBACK_CSS,
        Some("html" | "htm") => types::FALLBACK_HTML,
        _ => types::FALLBACK_TEXT,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_web_fallbacks() {
        assert_eq!(guess("x.js"), "application/javascript");
        assert_eq!(guess("style.css"), "text/css");
        assert_eq!(guess("index.html"), "text/html");
        assert_eq!(guess("index.htm"), "text/html");
        assert_eq!(guess("README"), "text/plain");
        assert_eq!(guess("data.unknown"), "text/plain");
    }

    #[test]
    fn test_extension_case_insensitive() {
        assert_eq!(guess("APP.JS"), "application/javascript");
        assert_eq!(guess("Index.HTML"), "text/html");
        assert_eq!(guess("logo.PNG"), types::PNG);
    }

    #[test]
    fn test_table_entries() {
        assert_eq!(guess("logo.png"), types::PNG);
        assert_eq!(guess("photo.jpeg"), types::JPEG);
        assert_eq!(guess("icon.svg"), types::SVG);
        assert_eq!(guess("font.woff2"), types::WOFF2);
        assert_eq!(guess("data.json"), types::JSON);
        assert_eq!(guess("module.mjs"), "application/javascript");
    }

    #[test]
    fn test_bare_extension_names() {
        assert_eq!(extension(".css").as_deref(), Some("css"));
        assert_eq!(guess(".css"), "text/css");
        assert_eq!(extension("trailing."), None);
        assert_eq!(guess("trailing."), "text/plain");
        assert_eq!(extension("dir.d/README"), None);
    }
}
