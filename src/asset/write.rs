//! Asset write-out.

use flate2::{Compression, GzBuilder};
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use super::Asset;
use crate::error::{BundleError, Result};
use crate::freshness::mtime;

impl Asset {
    /// Write the final content to `target`.
    ///
    /// A `.gz` target receives gzip output at `gzip_level`, with the gzip
    /// header mtime set to the asset's. The bytes land in a sibling temp file
    /// that is renamed over `target`, whose mtime is then set to the asset's.
    pub fn write_to(&self, target: &Path, gzip_level: u32) -> Result<()> {
        if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|err| BundleError::io(parent, err))?;
        }

        let tmp = temp_path(target);
        let written = self.write_file(&tmp, target, gzip_level);
        if let Err(err) = written {
            let _ = fs::remove_file(&tmp);
            return Err(BundleError::io(target, err));
        }

        fs::rename(&tmp, target).map_err(|err| {
            let _ = fs::remove_file(&tmp);
            BundleError::io(target, err)
        })?;

        crate::debug!("write"; "{} -> {}", self.logical_path(), target.display());
        Ok(())
    }

    fn write_file(&self, tmp: &Path, target: &Path, gzip_level: u32) -> io::Result<()> {
        let file = File::create(tmp)?;
        let mut out = BufWriter::new(file);

        if is_gzip(target) {
            let header_mtime = u32::try_from(mtime::to_nanos(self.mtime()) / 1_000_000_000)
                .unwrap_or(u32::MAX);
            let mut encoder = GzBuilder::new()
                .mtime(header_mtime)
                .write(&mut out, Compression::new(gzip_level.min(9)));
            encoder.write_all(self.as_bytes())?;
            encoder.finish()?;
        } else {
            out.write_all(self.as_bytes())?;
        }

        let file = out.into_inner().map_err(io::IntoInnerError::into_error)?;
        file.set_modified(self.mtime())?;
        file.sync_all()
    }
}

fn is_gzip(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("gz"))
}

/// `dir/.name.<pid>.tmp` next to `target`.
fn temp_path(target: &Path) -> PathBuf {
    let name = target
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    target.with_file_name(format!(".{name}.{}.tmp", std::process::id()))
}

#[cfg(test)]
mod tests {
    use crate::cache::AssetCache;
    use crate::config::BundleConfig;
    use crate::environment::Environment;
    use crate::freshness::mtime;
    use flate2::read::GzDecoder;
    use std::fs;
    use std::io::Read;
    use tempfile::TempDir;

    fn env_with(files: &[(&str, &str)]) -> (TempDir, Environment) {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("src");
        fs::create_dir_all(&src).unwrap();
        for (name, content) in files {
            fs::write(src.join(name), content).unwrap();
        }
        let env = Environment::new(BundleConfig::new([src]));
        (dir, env)
    }

    #[test]
    fn test_write_plain() {
        let (dir, env) = env_with(&[("app.js", "//= require lib\napp();\n"), ("lib.js", "lib();\n")]);
        let asset = env.find_asset("app.js", &AssetCache::memory()).unwrap();

        let target = dir.path().join("public/assets/app.js");
        asset.write_to(&target, 9).unwrap();

        assert_eq!(fs::read(&target).unwrap(), asset.as_bytes());
        assert_eq!(mtime::get_mtime(&target).unwrap(), asset.mtime());
        // Temp file was renamed away
        let leftovers: Vec<_> = fs::read_dir(target.parent().unwrap())
            .unwrap()
            .filter_map(Result::ok)
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn test_write_gzip() {
        let (dir, env) = env_with(&[("app.js", "app();\n")]);
        let asset = env.find_asset("app.js", &AssetCache::memory()).unwrap();

        let target = dir.path().join("out/app.js.gz");
        asset.write_to(&target, 6).unwrap();

        let mut decoded = Vec::new();
        GzDecoder::new(fs::File::open(&target).unwrap())
            .read_to_end(&mut decoded)
            .unwrap();
        assert_eq!(decoded, asset.as_bytes());

        // Header mtime is seconds since the epoch (bytes 4..8, little endian)
        let raw = fs::read(&target).unwrap();
        let header = u32::from_le_bytes([raw[4], raw[5], raw[6], raw[7]]);
        let expected = mtime::to_nanos(asset.mtime()) / 1_000_000_000;
        assert_eq!(u64::from(header), expected);
        assert_eq!(mtime::get_mtime(&target).unwrap(), asset.mtime());
    }

    #[test]
    fn test_overwrite_existing() {
        let (dir, env) = env_with(&[("app.js", "app();\n")]);
        let asset = env.find_asset("app.js", &AssetCache::memory()).unwrap();

        let target = dir.path().join("app.js");
        fs::write(&target, "old contents that are longer").unwrap();
        asset.write_to(&target, 9).unwrap();
        assert_eq!(fs::read_to_string(&target).unwrap(), "app();\n");
    }
}
