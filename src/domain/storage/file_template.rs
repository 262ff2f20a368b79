//! File template placements

use serde::{Deserialize, Serialize};

/// Where a template is read from or an output is written to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "storage", rename_all = "snake_case")]
pub enum FilePlacement {
    /// A path on a local or mounted filesystem. Both parts may contain
    /// template expressions rendered against the run context.
    Local { root: String, location: String },

    /// Collected into the run's download directory and zipped for the user
    Download,
}

/// A configured file location for a source or outcome
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileTemplate {
    #[serde(flatten)]
    placement: FilePlacement,
}

impl FileTemplate {
    pub fn local(root: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            placement: FilePlacement::Local {
                root: root.into(),
                location: location.into(),
            },
        }
    }

    pub fn download() -> Self {
        Self {
            placement: FilePlacement::Download,
        }
    }

    pub fn placement(&self) -> &FilePlacement {
        &self.placement
    }

    pub fn is_download(&self) -> bool {
        matches!(self.placement, FilePlacement::Download)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_download_sentinel() {
        assert!(FileTemplate::download().is_download());
        assert!(!FileTemplate::local("/data", "clients.csv").is_download());
    }

    #[test]
    fn test_deserialize_local() {
        let template: FileTemplate = serde_json::from_str(
            r#"{"storage": "local", "root": "/srv/out", "location": "{{ id }}.txt"}"#,
        )
        .unwrap();

        assert_eq!(
            template.placement(),
            &FilePlacement::Local {
                root: "/srv/out".to_string(),
                location: "{{ id }}.txt".to_string(),
            }
        );
    }

    #[test]
    fn test_deserialize_download() {
        let template: FileTemplate = serde_json::from_str(r#"{"storage": "download"}"#).unwrap();
        assert!(template.is_download());
    }
}
