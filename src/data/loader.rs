//! Catalog retrieval from Celestrak-style GP endpoints and local snapshots

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use std::time::Duration;

use flate2::read::GzDecoder;
use serde_json::Value;

use super::RawFields;
use crate::error::FetchError;

/// Celestrak general perturbations feed for all active objects, OMM as JSON
pub const CELESTRAK_ACTIVE_URL: &str =
    "https://celestrak.org/NORAD/elements/gp.php?GROUP=active&FORMAT=json";

/// Anything that yields one batch of raw OMM field maps
pub trait CatalogSource {
    /// Human-readable origin for logs
    fn describe(&self) -> String;

    /// Retrieve the whole catalog; no partial result is ever returned
    fn fetch(&self) -> Result<Vec<RawFields>, FetchError>;
}

/// Blocking HTTP catalog
pub struct HttpCatalog {
    url: String,
    client: reqwest::blocking::Client,
}

impl HttpCatalog {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, FetchError> {
        let url = url.into();
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("spacedb-tracker/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FetchError::Transport {
                url: url.clone(),
                message: e.to_string(),
            })?;
        Ok(Self { url, client })
    }
}

impl CatalogSource for HttpCatalog {
    fn describe(&self) -> String {
        self.url.clone()
    }

    fn fetch(&self) -> Result<Vec<RawFields>, FetchError> {
        log::info!("Retrieving catalog from {}", self.url);

        let response = self
            .client
            .get(&self.url)
            .send()
            .map_err(|e| FetchError::Transport {
                url: self.url.clone(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            log::warn!("Catalog retrieval error. Status code: {}", status.as_u16());
            return Err(FetchError::Status {
                url: self.url.clone(),
                status: status.as_u16(),
            });
        }

        let body: Value = response
            .json()
            .map_err(|e| FetchError::Decode(e.to_string()))?;
        let records = into_records(body)?;
        log::info!("Retrieved {} catalog records", records.len());
        Ok(records)
    }
}

/// Catalog snapshot on disk, plain JSON or gzip-compressed (`.gz`)
pub struct FileCatalog {
    path: PathBuf,
}

impl FileCatalog {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl CatalogSource for FileCatalog {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn fetch(&self) -> Result<Vec<RawFields>, FetchError> {
        log::info!("Loading catalog snapshot from {:?}", self.path);

        let io_err = |e: std::io::Error| FetchError::Io {
            path: self.path.display().to_string(),
            message: e.to_string(),
        };
        let file = File::open(&self.path).map_err(io_err)?;
        let reader = BufReader::new(file);

        let gzipped = self.path.extension().is_some_and(|ext| ext == "gz");
        let reader: Box<dyn Read> = if gzipped {
            Box::new(GzDecoder::new(reader))
        } else {
            Box::new(reader)
        };

        let body: Value =
            serde_json::from_reader(reader).map_err(|e| FetchError::Decode(e.to_string()))?;
        let records = into_records(body)?;
        log::info!("Loaded {} catalog records", records.len());
        Ok(records)
    }
}

/// Split a decoded body into field maps; every element must be an object
fn into_records(body: Value) -> Result<Vec<RawFields>, FetchError> {
    let Value::Array(items) = body else {
        return Err(FetchError::Decode("expected a JSON array".into()));
    };

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| match item {
            Value::Object(map) => Ok(map),
            other => Err(FetchError::Decode(format!(
                "element {index} is not an object: {other}"
            ))),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::raw::REQUIRED_FIELDS;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use axum::http::StatusCode;
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::json;
    use std::io::Write;
    use std::net::SocketAddr;
    use std::sync::mpsc;

    fn catalog_json() -> Value {
        json!([{
            "OBJECT_ID": "1998-067A",
            "OBJECT_NAME": "ISS (ZARYA)",
            "EPOCH": "2024-01-01T00:00:00.000",
            "NORAD_CAT_ID": 25544,
            "INCLINATION": 51.6432,
            "ECCENTRICITY": 0.0006703,
            "ARG_OF_PERICENTER": 130.5360,
            "RA_OF_ASC_NODE": 325.0288,
            "ELEMENT_SET_NO": 999,
            "EPHEMERIS_TYPE": 0,
            "MEAN_MOTION": 15.48912345,
            "MEAN_ANOMALY": 325.0288,
            "MEAN_MOTION_DOT": 0.00012345,
            "MEAN_MOTION_DDOT": 0.0,
            "REV_AT_EPOCH": 12345,
            "BSTAR": 0.0001234,
            "CLASSIFICATION_TYPE": "U"
        }])
    }

    /// Serve `router` on an ephemeral local port from its own runtime
    ///
    /// The blocking client must not run inside a tokio context, so the
    /// server lives on a separate thread.
    fn serve_locally(router: Router) -> SocketAddr {
        let (tx, rx) = mpsc::channel();
        std::thread::spawn(move || {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap();
            runtime.block_on(async move {
                let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
                tx.send(listener.local_addr().unwrap()).unwrap();
                axum::serve(listener, router).await.unwrap();
            });
        });
        rx.recv().unwrap()
    }

    fn catalog_at(addr: SocketAddr, path: &str) -> HttpCatalog {
        HttpCatalog::new(format!("http://{addr}{path}"), Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_http_catalog_success() {
        let addr = serve_locally(Router::new().route("/gp", get(|| async { Json(catalog_json()) })));

        let records = catalog_at(addr, "/gp").fetch().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["OBJECT_NAME"], json!("ISS (ZARYA)"));
    }

    #[test]
    fn test_http_catalog_unavailable_is_status_error() {
        let addr = serve_locally(Router::new().route(
            "/gp",
            get(|| async { (StatusCode::SERVICE_UNAVAILABLE, "catalog offline") }),
        ));

        let err = catalog_at(addr, "/gp").fetch().unwrap_err();
        match err {
            FetchError::Status { status, url } => {
                assert_eq!(status, 503);
                assert!(url.ends_with("/gp"));
            }
            other => panic!("expected status error, got {other:?}"),
        }
    }

    #[test]
    fn test_http_catalog_non_array_body_is_decode_error() {
        let addr = serve_locally(
            Router::new()
                .route("/object", get(|| async { Json(json!({"error": "rate limited"})) }))
                .route("/text", get(|| async { "No GP data found" })),
        );

        assert!(matches!(
            catalog_at(addr, "/object").fetch(),
            Err(FetchError::Decode(_))
        ));
        assert!(matches!(
            catalog_at(addr, "/text").fetch(),
            Err(FetchError::Decode(_))
        ));
    }

    #[test]
    fn test_plain_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("active.json");
        std::fs::write(&path, catalog_json().to_string()).unwrap();

        let records = FileCatalog::new(&path).fetch().unwrap();
        assert_eq!(records.len(), 1);
        for field in REQUIRED_FIELDS {
            assert!(records[0].contains_key(field), "missing {field}");
        }
    }

    #[test]
    fn test_gzip_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("active.json.gz");
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder
            .write_all(catalog_json().to_string().as_bytes())
            .unwrap();
        std::fs::write(&path, encoder.finish().unwrap()).unwrap();

        let records = FileCatalog::new(&path).fetch().unwrap();
        assert_eq!(records[0]["NORAD_CAT_ID"], json!(25544));
    }

    #[test]
    fn test_missing_snapshot_is_io_error() {
        let err = FileCatalog::new("/nonexistent/catalog.json")
            .fetch()
            .unwrap_err();
        assert!(matches!(err, FetchError::Io { .. }));
    }

    #[test]
    fn test_body_must_be_array_of_objects() {
        assert!(matches!(
            into_records(json!({"OBJECT_ID": "x"})),
            Err(FetchError::Decode(_))
        ));
        assert!(matches!(
            into_records(json!([{"a": 1}, 2])),
            Err(FetchError::Decode(_))
        ));
        assert!(into_records(json!([])).unwrap().is_empty());
    }
}
