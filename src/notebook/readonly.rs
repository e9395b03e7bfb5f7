#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Visual read-only markers. Editors do not reliably honour the
//! `editable`/`deletable` metadata, so tagged cells also get a banner.

use super::{CellType, Notebook};
use crate::constants::{
    CODE_READ_ONLY_BANNER, CODE_READ_ONLY_PREFIX, MARKDOWN_READ_ONLY_BANNER,
    MARKDOWN_READ_ONLY_PREFIX, READ_ONLY_TAG,
};

/// Locks every `read_only` cell and prepends a warning banner unless one is
/// already present. Returns how many cells were tagged.
pub fn mark_read_only(notebook: &mut Notebook) -> usize {
    let mut count = 0;
    for cell in notebook
        .cells
        .iter_mut()
        .filter(|c| c.has_tag(READ_ONLY_TAG))
    {
        cell.metadata.editable = Some(false);
        cell.metadata.deletable = Some(false);

        let banner = match cell.cell_type {
            CellType::Markdown => Some((MARKDOWN_READ_ONLY_PREFIX, MARKDOWN_READ_ONLY_BANNER)),
            CellType::Code => Some((CODE_READ_ONLY_PREFIX, CODE_READ_ONLY_BANNER)),
            CellType::Raw => None,
        };
        if let Some((prefix, banner)) = banner
            && !cell.source_text().starts_with(prefix)
        {
            cell.source.prepend(banner);
        }

        count += 1;
    }
    tracing::debug!("Marked {count} cells read-only");
    count
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notebook::Cell;

    #[test]
    fn banners_are_added_once() {
        let mut nb = Notebook::from_cells([
            Cell::markdown("Instructions", ["read_only"]),
            Cell::code("import numpy as np\n", ["read_only", "script"]),
            Cell::code("x = 1", ["script"]),
        ]);

        assert_eq!(mark_read_only(&mut nb), 2);
        assert_eq!(nb.cells[0].source_text(), "⚠️ **READ-ONLY CELL** ⚠️\n\nInstructions");
        assert_eq!(
            nb.cells[1].source_text(),
            "# ⚠️ READ-ONLY CELL - DO NOT EDIT ⚠️\nimport numpy as np\n"
        );
        assert_eq!(nb.cells[2].source_text(), "x = 1");
        assert_eq!(nb.cells[0].metadata.editable, Some(false));
        assert_eq!(nb.cells[1].metadata.deletable, Some(false));
        assert_eq!(nb.cells[2].metadata.editable, None);

        let once = nb.clone();
        assert_eq!(mark_read_only(&mut nb), 2);
        assert_eq!(nb, once);
    }
}
