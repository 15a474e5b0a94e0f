//! Test fixtures for integration tests
//!
//! Provides dictionary layouts, autocomplete indexes and free port ranges.

#![allow(dead_code)]

use std::net::TcpListener;
use std::path::{Path, PathBuf};

use dictfleet::config::Config;
use rusqlite::{params, Connection};
use tempfile::TempDir;

/// Words loaded into the sample autocomplete index
pub const SAMPLE_WORDS: &[&str] = &[
    "cat",
    "catalog",
    "Scatter",
    "dog",
    "concatenate",
    "education",
    "bobcat",
    "apple",
];

/// Write a minimal `.mdx` file: length-prefixed UTF-16LE header and its checksum
pub fn write_mdx(path: &Path, title: &str) {
    let xml = format!(
        r#"<Dictionary GeneratedByEngineVersion="2.0" Encoding="UTF-8" Title="{title}" Description="{title} description"/>"#
    );
    let mut body: Vec<u8> = xml.encode_utf16().flat_map(u16::to_le_bytes).collect();
    body.extend_from_slice(&[0, 0]);

    let mut bytes = (body.len() as u32).to_be_bytes().to_vec();
    bytes.extend_from_slice(&body);
    bytes.extend_from_slice(&adler2::adler32_slice(&body).to_le_bytes());
    std::fs::write(path, bytes).unwrap();
}

/// Create an empty file
pub fn touch(path: &Path) {
    std::fs::write(path, b"").unwrap();
}

/// `root/<name>/{<name>.mdx, <name>.mdd, ...}` for each name
pub fn nested_layout(names: &[&str]) -> TempDir {
    let tmp = TempDir::new().unwrap();
    for name in names {
        let dir = tmp.path().join(name);
        std::fs::create_dir(&dir).unwrap();
        write_mdx(&dir.join(format!("{name}.mdx")), name);
        touch(&dir.join(format!("{name}.mdd")));
        std::fs::write(dir.join(format!("{name}.css")), format!(".{name} {{}}")).unwrap();
    }
    tmp
}

/// Build `<dir>/ecdict_wfd.db` holding `words`
pub fn build_index(dir: &Path, words: &[&str]) -> PathBuf {
    let path = dir.join("ecdict_wfd.db");
    let conn = Connection::open(&path).unwrap();
    conn.execute(
        "CREATE TABLE ecdict_wfd (word TEXT NOT NULL, frq INTEGER)",
        [],
    )
    .unwrap();
    for (i, word) in words.iter().enumerate() {
        conn.execute(
            "INSERT INTO ecdict_wfd (word, frq) VALUES (?1, ?2)",
            params![word, i as i64],
        )
        .unwrap();
    }
    path
}

/// A base port with `count` consecutive free ports above it
pub fn free_port_range(count: u16) -> u16 {
    for _ in 0..50 {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let base = listener.local_addr().unwrap().port();
        drop(listener);

        if u32::from(base) + u32::from(count) > u32::from(u16::MAX) {
            continue;
        }

        let held: Vec<_> = (0..count)
            .map_while(|i| TcpListener::bind(("127.0.0.1", base + i)).ok())
            .collect();
        if held.len() == usize::from(count) {
            return base;
        }
    }
    panic!("no free range of {count} ports found");
}

/// A single free port
pub fn free_port() -> u16 {
    free_port_range(1)
}

/// Config rooted at `dir` with free ports for `members` dictionaries
pub fn test_config(dir: &Path, members: u16) -> Config {
    let mut config = Config::default();
    config.server.dir = Some(dir.to_path_buf());
    let base = free_port_range(members + 1);
    config.server.port = base;
    config.server.base_port = base + 1;
    config.server.enable_request_logging = false;
    config.server.shutdown_timeout_secs = 5;
    config
}

/// HTTP client that does not reuse connections between tests
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .build()
        .unwrap()
}
