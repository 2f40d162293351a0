//! Streaming tar+zstd extraction.
//!
//! Layers `tar::Archive` over a `zstd` streaming decoder reading straight
//! from the archive file, so decompression never buffers the whole archive.
//! Unpacking overwrites existing entries, which makes re-extraction into the
//! same destination idempotent.

use async_trait::async_trait;
use stash_core::ports::Extractor;
use stash_core::{Error, Result};
use std::path::{Path, PathBuf};

/// Default [`Extractor`] implementation for `.tzst` cache archives.
pub struct TarZstdExtractor;

impl TarZstdExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for TarZstdExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Extractor for TarZstdExtractor {
    async fn extract(&self, archive: &Path, dest: &Path, extra_args: &[String]) -> Result<()> {
        let dest = apply_extra_args(dest, extra_args)?;
        let archive = archive.to_path_buf();

        tracing::debug!(archive = %archive.display(), dest = %dest.display(), "unpacking archive");

        // Filesystem-bound work stays off the async runtime.
        tokio::task::spawn_blocking(move || unpack(&archive, &dest))
            .await
            .map_err(|e| Error::Extraction(format!("extraction task failed: {e}")))?
    }
}

/// Interpret pass-through options. Only directory overrides are understood;
/// anything else is rejected rather than silently dropped.
fn apply_extra_args(dest: &Path, extra_args: &[String]) -> Result<PathBuf> {
    let mut dest = dest.to_path_buf();
    let mut args = extra_args.iter();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-C" | "--directory" => {
                let value = args.next().ok_or_else(|| {
                    Error::Extraction(format!("option {arg} requires a directory argument"))
                })?;
                dest = PathBuf::from(value);
            }
            other => {
                if let Some(value) = other.strip_prefix("--directory=") {
                    dest = PathBuf::from(value);
                } else {
                    return Err(Error::Extraction(format!(
                        "unsupported extraction option: {other}"
                    )));
                }
            }
        }
    }
    Ok(dest)
}

fn unpack(archive: &Path, dest: &Path) -> Result<()> {
    let file = std::fs::File::open(archive).map_err(|e| {
        Error::Extraction(format!("can't open archive {}: {e}", archive.display()))
    })?;
    let decoder = zstd::stream::read::Decoder::new(file)
        .map_err(|e| Error::Extraction(format!("failed to start zstd decoder: {e}")))?;

    std::fs::create_dir_all(dest).map_err(|e| {
        Error::Extraction(format!(
            "can't create destination {}: {e}",
            dest.display()
        ))
    })?;

    let mut tar = tar::Archive::new(decoder);
    tar.unpack(dest)
        .map_err(|e| Error::Extraction(format!("failed to unpack archive: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    /// Pack the fixture tree the save pipeline would have produced:
    /// a file at the root, a file in a subdirectory, and an empty directory.
    fn pack_fixture(archive: &Path, src: &Path) {
        let file = fs::File::create(archive).unwrap();
        let encoder = zstd::stream::write::Encoder::new(file, 3).unwrap();
        let mut builder = tar::Builder::new(encoder);
        builder
            .append_path_with_name(src.join("a.txt"), "a.txt")
            .unwrap();
        builder.append_dir("dir", src.join("dir")).unwrap();
        builder
            .append_path_with_name(src.join("dir/b.txt"), "dir/b.txt")
            .unwrap();
        builder.append_dir("dir2", src.join("dir2")).unwrap();
        let encoder = builder.into_inner().unwrap();
        encoder.finish().unwrap();
    }

    fn fixture_src(root: &Path) -> PathBuf {
        let src = root.join("src");
        fs::create_dir_all(src.join("dir")).unwrap();
        fs::create_dir_all(src.join("dir2")).unwrap();
        fs::write(src.join("a.txt"), b"alpha").unwrap();
        fs::write(src.join("dir/b.txt"), b"beta").unwrap();
        src
    }

    #[tokio::test]
    async fn round_trip_reproduces_the_source_tree() {
        let tmp = tempfile::tempdir().unwrap();
        let src = fixture_src(tmp.path());
        let archive = tmp.path().join("fixture.tzst");
        pack_fixture(&archive, &src);

        let dest = tmp.path().join("restored");
        TarZstdExtractor::new()
            .extract(&archive, &dest, &[])
            .await
            .unwrap();

        assert_eq!(fs::read(dest.join("a.txt")).unwrap(), b"alpha");
        assert_eq!(fs::read(dest.join("dir/b.txt")).unwrap(), b"beta");
        assert!(dest.join("dir2").is_dir(), "empty directory entry lost");
    }

    #[tokio::test]
    async fn re_extraction_overwrites_existing_entries() {
        let tmp = tempfile::tempdir().unwrap();
        let src = fixture_src(tmp.path());
        let archive = tmp.path().join("fixture.tzst");
        pack_fixture(&archive, &src);

        let dest = tmp.path().join("restored");
        let extractor = TarZstdExtractor::new();
        extractor.extract(&archive, &dest, &[]).await.unwrap();

        // Locally modified entry gets clobbered by the archived content.
        fs::write(dest.join("a.txt"), b"locally modified").unwrap();
        extractor.extract(&archive, &dest, &[]).await.unwrap();

        assert_eq!(fs::read(dest.join("a.txt")).unwrap(), b"alpha");
    }

    #[tokio::test]
    async fn missing_archive_fails_and_leaves_destination_untouched() {
        let tmp = tempfile::tempdir().unwrap();
        let dest = tmp.path().join("restored");

        let err = TarZstdExtractor::new()
            .extract(&tmp.path().join("nope.tzst"), &dest, &[])
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Extraction(_)));
        assert!(!dest.exists());
    }

    #[tokio::test]
    async fn corrupt_archive_fails_with_the_codec_diagnostic() {
        let tmp = tempfile::tempdir().unwrap();
        let archive = tmp.path().join("garbage.tzst");
        fs::write(&archive, b"definitely not zstd").unwrap();

        let err = TarZstdExtractor::new()
            .extract(&archive, &tmp.path().join("restored"), &[])
            .await
            .unwrap_err();

        match err {
            Error::Extraction(msg) => assert!(!msg.is_empty()),
            other => panic!("expected Extraction, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn directory_option_overrides_the_destination() {
        let tmp = tempfile::tempdir().unwrap();
        let src = fixture_src(tmp.path());
        let archive = tmp.path().join("fixture.tzst");
        pack_fixture(&archive, &src);

        let ignored = tmp.path().join("ignored");
        let actual = tmp.path().join("actual");
        TarZstdExtractor::new()
            .extract(
                &archive,
                &ignored,
                &["-C".to_string(), actual.display().to_string()],
            )
            .await
            .unwrap();

        assert!(actual.join("a.txt").is_file());
        assert!(!ignored.exists());

        let long_form = tmp.path().join("long-form");
        TarZstdExtractor::new()
            .extract(
                &archive,
                &ignored,
                &[format!("--directory={}", long_form.display())],
            )
            .await
            .unwrap();
        assert!(long_form.join("a.txt").is_file());
    }

    #[tokio::test]
    async fn unknown_options_are_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let err = TarZstdExtractor::new()
            .extract(
                &tmp.path().join("fixture.tzst"),
                &tmp.path().join("restored"),
                &["--strip-components=1".to_string()],
            )
            .await
            .unwrap_err();

        match err {
            Error::Extraction(msg) => assert!(msg.contains("--strip-components=1")),
            other => panic!("expected Extraction, got {other:?}"),
        }
    }
}
