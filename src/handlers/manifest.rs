use std::io::Read;
use std::path::{Path, PathBuf};

use serde_yaml::{Mapping, Value};

use crate::analyzer::chart::values::{load_values_file, merge_values};
use crate::analyzer::images::discover;
use crate::cli::DiscoveryArgs;
use crate::config::Config;
use crate::error::ScannerError;
use crate::handlers::utils::render_discovery;

/// List the images in an already-rendered manifest stream.
///
/// `-f` files are merged into the values tree; no chart or Helm is involved.
pub fn handle_manifest(file: PathBuf, args: &DiscoveryArgs, config: &Config) -> crate::Result<String> {
    let manifests = read_manifests(&file)?;

    let mut values = Value::Mapping(Mapping::new());
    for path in &args.values {
        merge_values(&mut values, load_values_file(path)?);
    }

    let discovery = discover(&manifests, &values, &args.options(config));
    render_discovery(&discovery, args.output_format())
}

fn read_manifests(file: &Path) -> crate::Result<String> {
    if file.as_os_str() == "-" {
        let mut content = String::new();
        std::io::stdin().read_to_string(&mut content)?;
        return Ok(content);
    }
    std::fs::read_to_string(file).map_err(|source| ScannerError::Read {
        path: file.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_manifest_with_values() {
        let dir = tempfile::tempdir().unwrap();
        let manifests = write(
            dir.path(),
            "out.yaml",
            "kind: Pod\nspec:\n  containers:\n    - image: nginx\n",
        );
        let values = write(
            dir.path(),
            "values.yaml",
            "worker:\n  image:\n    repository: busybox\n    tag: \"1.36\"\n",
        );
        let args = DiscoveryArgs {
            values: vec![values],
            ..DiscoveryArgs::default()
        };

        let output = handle_manifest(manifests, &args, &Config::default()).unwrap();
        assert_eq!(output, "busybox:1.36\nnginx:latest\n");
    }

    #[test]
    fn test_manifest_missing_file() {
        let err = handle_manifest(
            PathBuf::from("/nonexistent/out.yaml"),
            &DiscoveryArgs::default(),
            &Config::default(),
        )
        .unwrap_err();
        assert!(matches!(err, ScannerError::Read { .. }));
    }

    #[test]
    fn test_manifest_without_images() {
        let dir = tempfile::tempdir().unwrap();
        let manifests = write(dir.path(), "out.yaml", "kind: ConfigMap\ndata:\n  a: b\n");
        let err = handle_manifest(manifests, &DiscoveryArgs::default(), &Config::default())
            .unwrap_err();
        assert!(matches!(err, ScannerError::NoImagesFound));
    }
}
