//! Fetched grid slices.
//!
//! A [`GridSlice`] holds the values of one coverage variable over two
//! spatial axes and any number of non-spatial axes. Internally values are
//! kept in a canonical row-major layout `[non-spatial..., y, x]`, so that
//! each combination of non-spatial coordinates owns one contiguous
//! y-by-x layer and layers appear in enumeration order (first axis
//! slowest).

use coverage::SpatialRole;
use ndarray::{Array3, ArrayD, ArrayView2, ArrayViewD, Axis, IxDyn, ShapeError};
use serde::{Deserialize, Serialize};
use zonal_common::{BoundingBox, Crs, ZonalError, ZonalResult};

use crate::resample::{resample_grid, upsample_coordinates};

/// One named axis of a grid with its ordered coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridAxis {
    pub name: String,
    pub coordinates: Vec<f64>,
    /// Step between coordinates, needed when only one coordinate is present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution: Option<f64>,
}

impl GridAxis {
    pub fn new(name: impl Into<String>, coordinates: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            coordinates,
            resolution: None,
        }
    }

    pub fn with_resolution(mut self, resolution: f64) -> Self {
        self.resolution = Some(resolution);
        self
    }

    pub fn len(&self) -> usize {
        self.coordinates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coordinates.is_empty()
    }

    /// Signed coordinate step.
    pub fn spacing(&self) -> Option<f64> {
        match self.coordinates.as_slice() {
            [first, second, ..] => Some(second - first),
            _ => self.resolution,
        }
    }

    fn select(&self, indices: &[usize]) -> GridAxis {
        GridAxis {
            name: self.name.clone(),
            coordinates: indices.iter().map(|&i| self.coordinates[i]).collect(),
            resolution: self.spacing(),
        }
    }
}

/// Serialized form of a grid slice.
///
/// `values` are row-major over `axes` in the listed order; `null` marks a
/// missing value. Spatial axes are named by `x_axis`/`y_axis`, or found by
/// their conventional names.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridDocument {
    #[serde(default)]
    pub crs: Option<String>,
    pub axes: Vec<GridAxis>,
    pub values: Vec<Option<f64>>,
    #[serde(default)]
    pub x_axis: Option<String>,
    #[serde(default)]
    pub y_axis: Option<String>,
}

/// Values of a coverage over its spatial and non-spatial axes.
#[derive(Debug, Clone, PartialEq)]
pub struct GridSlice {
    crs: Option<Crs>,
    non_spatial: Vec<GridAxis>,
    x: GridAxis,
    y: GridAxis,
    /// (layer, y, x), one layer per non-spatial combination.
    values: Array3<f64>,
}

impl GridSlice {
    /// Build a slice from values already in `[non-spatial..., y, x]` order.
    pub fn new(
        crs: Option<Crs>,
        non_spatial: Vec<GridAxis>,
        x: GridAxis,
        y: GridAxis,
        values: Vec<f64>,
    ) -> ZonalResult<Self> {
        if x.is_empty() || y.is_empty() {
            return Err(ZonalError::invalid_grid("Spatial axes must not be empty"));
        }
        if let Some(axis) = non_spatial.iter().find(|axis| axis.is_empty()) {
            return Err(ZonalError::invalid_grid(format!(
                "Axis '{}' has no coordinates",
                axis.name
            )));
        }

        let layers: usize = non_spatial.iter().map(GridAxis::len).product();
        let expected = layers * x.len() * y.len();
        if values.len() != expected {
            return Err(ZonalError::invalid_grid(format!(
                "Expected {} values for the declared axes, got {}",
                expected,
                values.len()
            )));
        }
        let values =
            Array3::from_shape_vec((layers, y.len(), x.len()), values).map_err(shape_error)?;

        Ok(Self {
            crs,
            non_spatial,
            x,
            y,
            values,
        })
    }

    /// Build a slice from its serialized form, transposing the values into
    /// the canonical layout.
    pub fn from_document(document: GridDocument) -> ZonalResult<Self> {
        let crs = document
            .crs
            .as_deref()
            .map(Crs::parse)
            .transpose()
            .map_err(|e| ZonalError::spatial_reference(e.to_string()))?;

        let x_index = locate_axis(&document.axes, document.x_axis.as_deref(), SpatialRole::X)?;
        let y_index = locate_axis(&document.axes, document.y_axis.as_deref(), SpatialRole::Y)?;
        if x_index == y_index {
            return Err(ZonalError::invalid_grid("x and y name the same axis"));
        }

        let shape: Vec<usize> = document.axes.iter().map(GridAxis::len).collect();
        let expected: usize = shape.iter().product();
        if document.values.len() != expected {
            return Err(ZonalError::invalid_grid(format!(
                "Expected {} values for axes {:?}, got {}",
                expected,
                shape,
                document.values.len()
            )));
        }

        // Canonical axis order as indices into the document's axes
        let mut order: Vec<usize> = (0..document.axes.len())
            .filter(|&i| i != x_index && i != y_index)
            .collect();
        order.push(y_index);
        order.push(x_index);

        let declared: Vec<f64> = document
            .values
            .into_iter()
            .map(|v| v.unwrap_or(f64::NAN))
            .collect();
        let declared = ArrayD::from_shape_vec(IxDyn(&shape), declared).map_err(shape_error)?;
        let values: Vec<f64> = declared.permuted_axes(IxDyn(&order)).iter().copied().collect();

        let mut axes = document.axes;
        let x = std::mem::replace(&mut axes[x_index], GridAxis::new("", Vec::new()));
        let y = std::mem::replace(&mut axes[y_index], GridAxis::new("", Vec::new()));
        let non_spatial = order[..order.len() - 2]
            .iter()
            .map(|&i| std::mem::replace(&mut axes[i], GridAxis::new("", Vec::new())))
            .collect();

        Self::new(crs, non_spatial, x, y, values)
    }

    pub fn crs(&self) -> Option<Crs> {
        self.crs
    }

    pub fn x(&self) -> &GridAxis {
        &self.x
    }

    pub fn y(&self) -> &GridAxis {
        &self.y
    }

    pub fn non_spatial_axes(&self) -> &[GridAxis] {
        &self.non_spatial
    }

    pub fn width(&self) -> usize {
        self.x.len()
    }

    pub fn height(&self) -> usize {
        self.y.len()
    }

    /// Number of non-spatial combinations (1 when there are none).
    pub fn layer_count(&self) -> usize {
        self.values.len_of(Axis(0))
    }

    /// The y-by-x values of one combination.
    pub fn layer(&self, layer: usize) -> ArrayView2<'_, f64> {
        self.values.index_axis(Axis(0), layer)
    }

    pub fn values(&self) -> &Array3<f64> {
        &self.values
    }

    /// Area of one grid cell in squared CRS units.
    pub fn cell_area(&self) -> ZonalResult<f64> {
        let (dx, dy) = self.cell_size()?;
        let area = (dx * dy).abs();
        if !area.is_finite() || area <= 0.0 {
            return Err(ZonalError::invalid_grid(format!(
                "Grid cell area must be positive, got {}",
                area
            )));
        }
        Ok(area)
    }

    /// Signed (dx, dy) coordinate steps.
    pub fn cell_size(&self) -> ZonalResult<(f64, f64)> {
        let dx = self.x.spacing().ok_or_else(|| {
            ZonalError::invalid_grid("Cannot derive x resolution from one coordinate")
        })?;
        let dy = self.y.spacing().ok_or_else(|| {
            ZonalError::invalid_grid("Cannot derive y resolution from one coordinate")
        })?;
        Ok((dx, dy))
    }

    /// Keep the cells whose extent overlaps `bbox`.
    ///
    /// Fails with `NoData` when no cell overlaps.
    pub fn clip(&self, bbox: &BoundingBox) -> ZonalResult<GridSlice> {
        let (dx, dy) = self.cell_size()?;
        let (half_x, half_y) = (dx.abs() / 2.0, dy.abs() / 2.0);

        let columns = overlapping(&self.x.coordinates, half_x, bbox.min_x, bbox.max_x);
        let rows = overlapping(&self.y.coordinates, half_y, bbox.min_y, bbox.max_y);
        if columns.is_empty() || rows.is_empty() {
            return Err(ZonalError::NoData(
                "Requested area does not overlap the coverage".to_string(),
            ));
        }

        let mut selections = self.full_selections();
        selections.push(rows);
        selections.push(columns);
        self.take(&selections)
    }

    /// Keep only the listed coordinates of a non-spatial axis, in grid order.
    pub fn subset(&self, axis: &str, coordinates: &[f64]) -> ZonalResult<GridSlice> {
        let position = self
            .non_spatial
            .iter()
            .position(|a| a.name == axis)
            .ok_or_else(|| ZonalError::invalid_grid(format!("Grid has no axis '{}'", axis)))?;

        let keep: Vec<usize> = self.non_spatial[position]
            .coordinates
            .iter()
            .enumerate()
            .filter(|(_, c)| coordinates.iter().any(|wanted| (*c - wanted).abs() < 1e-9))
            .map(|(i, _)| i)
            .collect();
        if keep.is_empty() {
            return Err(ZonalError::NoData(format!(
                "No coordinates of axis '{}' match the requested subset",
                axis
            )));
        }

        let mut selections = self.full_selections();
        selections[position] = keep;
        selections.push((0..self.height()).collect());
        selections.push((0..self.width()).collect());
        self.take(&selections)
    }

    /// Upsample the spatial axes by `factor` with nearest-neighbor
    /// sampling. Coordinates keep their original span.
    pub fn upsampled(&self, factor: usize) -> ZonalResult<GridSlice> {
        let (x, y) = self.upsampled_axes(factor)?;
        let mut values = Vec::with_capacity(self.layer_count() * x.len() * y.len());
        for layer in self.values.outer_iter() {
            values.extend(resample_grid(layer, x.len(), y.len()).iter().copied());
        }
        GridSlice::new(self.crs, self.non_spatial.clone(), x, y, values)
    }

    /// The spatial axes at `factor` times their density.
    pub fn upsampled_axes(&self, factor: usize) -> ZonalResult<(GridAxis, GridAxis)> {
        if factor == 0 {
            return Err(ZonalError::invalid_grid("Upsampling factor must be at least 1"));
        }
        let (dx, dy) = self.cell_size()?;
        let x_coordinates = upsample_coordinates(&self.x.coordinates, dx, factor);
        let y_coordinates = upsample_coordinates(&self.y.coordinates, dy, factor);
        let x = GridAxis::new(self.x.name.clone(), x_coordinates)
            .with_resolution(dx / factor as f64);
        let y = GridAxis::new(self.y.name.clone(), y_coordinates)
            .with_resolution(dy / factor as f64);
        Ok((x, y))
    }

    /// Values as `[non-spatial..., y, x]`.
    fn canonical(&self) -> ZonalResult<ArrayViewD<'_, f64>> {
        let shape: Vec<usize> = self
            .non_spatial
            .iter()
            .map(GridAxis::len)
            .chain([self.height(), self.width()])
            .collect();
        self.values
            .view()
            .into_shape_with_order(IxDyn(&shape))
            .map_err(shape_error)
    }

    fn full_selections(&self) -> Vec<Vec<usize>> {
        self.non_spatial
            .iter()
            .map(|axis| (0..axis.len()).collect())
            .collect()
    }

    /// Select indices along every canonical dimension.
    fn take(&self, selections: &[Vec<usize>]) -> ZonalResult<GridSlice> {
        let mut selected: ArrayD<f64> = self.canonical()?.to_owned();
        for (dim, indices) in selections.iter().enumerate() {
            selected = selected.select(Axis(dim), indices);
        }

        let dims = selections.len();
        let non_spatial = self
            .non_spatial
            .iter()
            .zip(selections)
            .map(|(axis, selection)| GridAxis {
                name: axis.name.clone(),
                coordinates: selection.iter().map(|&i| axis.coordinates[i]).collect(),
                resolution: axis.resolution,
            })
            .collect();

        GridSlice::new(
            self.crs,
            non_spatial,
            self.x.select(&selections[dims - 1]),
            self.y.select(&selections[dims - 2]),
            selected.iter().copied().collect(),
        )
    }
}

fn shape_error(err: ShapeError) -> ZonalError {
    ZonalError::invalid_grid(format!("Grid values do not fit the axes: {}", err))
}

fn locate_axis(
    axes: &[GridAxis],
    explicit: Option<&str>,
    role: SpatialRole,
) -> ZonalResult<usize> {
    let found = match explicit {
        Some(name) => axes.iter().position(|a| a.name == name),
        None => axes
            .iter()
            .position(|a| SpatialRole::classify(&a.name) == Some(role)),
    };
    found.ok_or_else(|| ZonalError::invalid_grid(format!("Grid has no {:?} axis", role)))
}

fn overlapping(coordinates: &[f64], half: f64, min: f64, max: f64) -> Vec<usize> {
    coordinates
        .iter()
        .enumerate()
        .filter(|(_, c)| *c + half > min && *c - half < max)
        .map(|(i, _)| i)
        .collect()
}
