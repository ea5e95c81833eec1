use serde::{Deserialize, Serialize};

use super::cell::{CellSpec, FormFactor};

/// Physical arrangement of cells in a pack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CellArrangement {
    /// Side-by-side grid.
    Inline,
    /// Honeycomb rows (cylindrical only), more compact.
    Staggered,
    /// Single column along the cell axis.
    Stacked,
}

/// Bounding box of a pack, origin at the corner nearest (0, 0, 0).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PackDimensions {
    pub length_mm: f64,
    pub width_mm: f64,
    pub height_mm: f64,
    pub cells_x: u32,
    pub cells_y: u32,
    pub cells_z: u32,
}

impl PackDimensions {
    pub fn volume_ml(&self) -> f64 {
        self.length_mm * self.width_mm * self.height_mm / 1000.0
    }
}

/// Center of gravity relative to the bounding-box origin; symmetric
/// arrangements put it at the geometric center.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CenterOfGravity {
    pub x_mm: f64,
    pub y_mm: f64,
    pub z_mm: f64,
}

pub fn pack_dimensions(
    cell: &CellSpec,
    series: u32,
    parallel: u32,
    arrangement: CellArrangement,
    cell_gap_mm: f64,
    lipo_swell_margin: f64,
    lipo_tab_protrusion_mm: f64,
) -> PackDimensions {
    if cell.form_factor == FormFactor::Pouch {
        pouch_dimensions(cell, series, parallel, cell_gap_mm, lipo_swell_margin, lipo_tab_protrusion_mm)
    } else {
        cylindrical_dimensions(cell, series, parallel, arrangement, cell_gap_mm)
    }
}

fn cylindrical_dimensions(
    cell: &CellSpec,
    series: u32,
    parallel: u32,
    arrangement: CellArrangement,
    cell_gap_mm: f64,
) -> PackDimensions {
    let total = series * parallel;
    let diameter = cell.diameter_mm.unwrap_or(0.0);
    let length = cell.length_mm.unwrap_or(0.0);

    match arrangement {
        CellArrangement::Stacked => PackDimensions {
            length_mm: total as f64 * length + (total - 1) as f64 * cell_gap_mm,
            width_mm: diameter + cell_gap_mm,
            height_mm: diameter + cell_gap_mm,
            cells_x: 1,
            cells_y: 1,
            cells_z: total,
        },
        CellArrangement::Staggered => {
            let (cells_x, cells_y, cells_z) = grid_arrangement(series, parallel);
            let row_spacing = (diameter + cell_gap_mm) * 0.866;
            PackDimensions {
                length_mm: cells_z as f64 * length + (cells_z - 1) as f64 * cell_gap_mm,
                width_mm: cells_x as f64 * (diameter + cell_gap_mm),
                height_mm: diameter + (cells_y - 1) as f64 * row_spacing + cell_gap_mm,
                cells_x,
                cells_y,
                cells_z,
            }
        }
        CellArrangement::Inline => {
            let (cells_x, cells_y, cells_z) = grid_arrangement(series, parallel);
            PackDimensions {
                length_mm: cells_z as f64 * length + (cells_z - 1) as f64 * cell_gap_mm,
                width_mm: cells_x as f64 * (diameter + cell_gap_mm),
                height_mm: cells_y as f64 * (diameter + cell_gap_mm),
                cells_x,
                cells_y,
                cells_z,
            }
        }
    }
}

fn pouch_dimensions(
    cell: &CellSpec,
    series: u32,
    parallel: u32,
    cell_gap_mm: f64,
    swell_margin: f64,
    tab_protrusion_mm: f64,
) -> PackDimensions {
    // Pouches stack along their thickness; tabs extend the body height
    let stacked = series * parallel;
    let thickness = cell.thickness_mm.unwrap_or(0.0) * (1.0 + swell_margin);

    PackDimensions {
        length_mm: cell.height_mm.unwrap_or(0.0) + tab_protrusion_mm,
        width_mm: cell.width_mm.unwrap_or(0.0) + cell_gap_mm,
        height_mm: stacked as f64 * thickness + (stacked - 1) as f64 * cell_gap_mm,
        cells_x: 1,
        cells_y: 1,
        cells_z: stacked,
    }
}

/// Pick a low-profile grid: parallel groups side by side, series cells
/// along the pack axis; wide groups fold into two rows.
fn grid_arrangement(series: u32, parallel: u32) -> (u32, u32, u32) {
    if parallel == 1 {
        if series <= 4 {
            (series, 1, 1)
        } else {
            (series.div_ceil(2), 2, 1)
        }
    } else if parallel >= 4 {
        (parallel.div_ceil(2), 2, series)
    } else {
        (parallel, 1, series)
    }
}

pub fn pack_cog(dimensions: &PackDimensions) -> CenterOfGravity {
    CenterOfGravity {
        x_mm: dimensions.length_mm / 2.0,
        y_mm: dimensions.width_mm / 2.0,
        z_mm: dimensions.height_mm / 2.0,
    }
}

/// Empty-space fraction of the bounding box.
pub fn void_fraction(cell: &CellSpec, dimensions: &PackDimensions, total_cells: u32) -> f64 {
    let pack_volume = dimensions.volume_ml();
    if pack_volume <= 0.0 {
        return 0.0;
    }
    let cell_fraction = cell.volume_ml() * total_cells as f64 / pack_volume;
    1.0 - cell_fraction.min(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battery::database::CellDatabase;
    use approx::assert_relative_eq;

    fn p45b() -> CellSpec {
        CellDatabase::builtin().get("Molicel P45B").unwrap().clone()
    }

    #[test]
    fn inline_6s2p_grid() {
        let dims = pack_dimensions(&p45b(), 6, 2, CellArrangement::Inline, 0.5, 0.08, 12.0);
        assert_eq!((dims.cells_x, dims.cells_y, dims.cells_z), (2, 1, 6));
        // 6 cells of 70.15 mm along the axis plus gaps
        assert_relative_eq!(dims.length_mm, 6.0 * 70.15 + 5.0 * 0.5, epsilon = 1e-6);
        assert_relative_eq!(dims.width_mm, 2.0 * (21.7 + 0.5), epsilon = 1e-6);
    }

    #[test]
    fn staggered_packs_tighter_than_inline() {
        let cell = p45b();
        let inline = pack_dimensions(&cell, 4, 4, CellArrangement::Inline, 0.5, 0.08, 12.0);
        let staggered = pack_dimensions(&cell, 4, 4, CellArrangement::Staggered, 0.5, 0.08, 12.0);
        assert!(staggered.height_mm < inline.height_mm);
        assert!(staggered.volume_ml() < inline.volume_ml());
    }

    #[test]
    fn stacked_is_one_long_column() {
        let dims = pack_dimensions(&p45b(), 3, 1, CellArrangement::Stacked, 0.5, 0.08, 12.0);
        assert_eq!(dims.cells_z, 3);
        assert!(dims.length_mm > 3.0 * 70.0);
        assert_relative_eq!(dims.width_mm, dims.height_mm);
    }

    #[test]
    fn cog_is_the_box_center() {
        let dims = pack_dimensions(&p45b(), 6, 2, CellArrangement::Inline, 0.5, 0.08, 12.0);
        let cog = pack_cog(&dims);
        assert_relative_eq!(cog.x_mm, dims.length_mm / 2.0);
        assert_relative_eq!(cog.y_mm, dims.width_mm / 2.0);
        assert_relative_eq!(cog.z_mm, dims.height_mm / 2.0);
    }

    #[test]
    fn void_fraction_in_unit_range() {
        let cell = p45b();
        let dims = pack_dimensions(&cell, 6, 2, CellArrangement::Inline, 0.5, 0.08, 12.0);
        let void = void_fraction(&cell, &dims, 12);
        assert!(void > 0.0 && void < 1.0, "void = {void}");
    }
}
