use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::layout::Page;
use crate::pipeline::{Invocation, ToolRunner};

const PAGE_FILE_PREFIX: &str = "page";

pub fn page_file_name(index: usize) -> String {
    format!("{}{}.tif", PAGE_FILE_PREFIX, index)
}

/// Writes every page as a single-page greyscale TIFF in `dir`, in index order.
pub fn write_pages(pages: &[Page], dir: &Path) -> Result<Vec<PathBuf>> {
    let mut ordered: Vec<&Page> = pages.iter().collect();
    ordered.sort_by_key(|page| page.index);
    let mut written = Vec::with_capacity(ordered.len());
    for page in ordered {
        let path = dir.join(page_file_name(page.index));
        info!("Generating individual tif image {}", path.display());
        page.image
            .save_with_format(&path, image::ImageFormat::Tiff)
            .with_context(|| format!("failed to write page: {}", path.display()))?;
        written.push(path);
    }
    Ok(written)
}

/// Merges single-page TIFFs into one multi-page TIFF with an ImageMagick-style
/// `<tool> in0 in1 ... out` command.
pub fn merge_pages<R: ToolRunner + ?Sized>(
    runner: &R,
    tool: &str,
    pages: &[PathBuf],
    output: &Path,
    cwd: &Path,
) -> Result<()> {
    let mut args: Vec<String> = pages
        .iter()
        .map(|path| path.to_string_lossy().to_string())
        .collect();
    args.push(output.to_string_lossy().to_string());
    info!("Generating multipage-tif {}", output.display());
    runner
        .run(&Invocation::new(tool, args, cwd.to_path_buf()))
        .with_context(|| format!("failed to merge pages into {}", output.display()))?;
    Ok(())
}

pub fn remove_pages(pages: &[PathBuf]) -> Result<()> {
    for path in pages {
        debug!("removing {}", path.display());
        std::fs::remove_file(path)
            .with_context(|| format!("failed to remove page: {}", path.display()))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::ToolOutput;
    use image::{GrayImage, Luma};
    use std::cell::RefCell;

    #[derive(Default)]
    struct Recorder {
        calls: RefCell<Vec<Invocation>>,
    }

    impl ToolRunner for Recorder {
        fn run(&self, invocation: &Invocation) -> Result<ToolOutput> {
            self.calls.borrow_mut().push(invocation.clone());
            Ok(ToolOutput::default())
        }
    }

    fn page(index: usize) -> Page {
        Page {
            index,
            image: GrayImage::from_pixel(8, 6, Luma([255])),
        }
    }

    #[test]
    fn writes_readable_greyscale_tiffs_in_index_order() {
        let dir = tempfile::tempdir().expect("tempdir");
        let written = write_pages(&[page(1), page(0)], dir.path()).expect("write");
        assert_eq!(
            written,
            vec![dir.path().join("page0.tif"), dir.path().join("page1.tif")]
        );
        let decoded = image::open(&written[0]).expect("decode");
        assert_eq!((decoded.width(), decoded.height()), (8, 6));
        assert_eq!(decoded.color(), image::ColorType::L8);

        remove_pages(&written).expect("remove");
        assert!(written.iter().all(|path| !path.exists()));
    }

    #[test]
    fn merge_lists_pages_then_output() {
        let recorder = Recorder::default();
        let pages = vec![PathBuf::from("page0.tif"), PathBuf::from("page1.tif")];
        merge_pages(
            &recorder,
            "convert",
            &pages,
            Path::new("eng.font.exp0.tif"),
            Path::new("/work"),
        )
        .expect("merge");
        let calls = recorder.calls.borrow();
        assert_eq!(calls.len(), 1);
        assert_eq!(
            calls[0].command_line(),
            "convert page0.tif page1.tif eng.font.exp0.tif"
        );
        assert_eq!(calls[0].cwd, PathBuf::from("/work"));
    }
}
