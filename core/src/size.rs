//! Per-axis size modes and their resolution.
//!
//! Every node carries an independent [`SizeMode`] for each of the X, Y and Z
//! axes:
//!
//! - [`SizeMode::Absolute`]: the axis is a literal extent in logical pixels.
//! - [`SizeMode::Relative`]: the axis is a fraction of the parent's resolved
//!   extent on the same axis, recomputed whenever the parent changes.
//! - [`SizeMode::Render`]: the axis is measured by the renderer from the
//!   node's content. It stays [`Resolution::Pending`] until a size report
//!   arrives.
//!
//! The functions here are pure. Caching and invalidation order are driven by
//! [`Scene`](crate::Scene), which walks the tree.

use core::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::{Result, SceneError};

/// Policy that decides how one axis of a node obtains its extent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SizeMode {
    /// Fraction of the parent's resolved extent.
    #[default]
    Relative,
    /// Literal extent set by the caller.
    Absolute,
    /// Extent reported by the renderer.
    Render,
}

impl SizeMode {
    /// Numeric code used on the wire.
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::Relative => 0,
            Self::Absolute => 1,
            Self::Render => 2,
        }
    }
}

impl TryFrom<u8> for SizeMode {
    type Error = SceneError;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(Self::Relative),
            1 => Ok(Self::Absolute),
            2 => Ok(Self::Render),
            other => Err(SceneError::InvalidSizeMode(other.to_string())),
        }
    }
}

impl FromStr for SizeMode {
    type Err = SceneError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "relative" => Ok(Self::Relative),
            "absolute" => Ok(Self::Absolute),
            "render" => Ok(Self::Render),
            _ => Err(SceneError::InvalidSizeMode(s.to_owned())),
        }
    }
}

impl fmt::Display for SizeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Relative => "RELATIVE",
            Self::Absolute => "ABSOLUTE",
            Self::Render => "RENDER",
        })
    }
}

/// One of the three spatial axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    /// Horizontal extent.
    X,
    /// Vertical extent.
    Y,
    /// Depth.
    Z,
}

impl Axis {
    /// All axes in positional order.
    pub const ALL: [Self; 3] = [Self::X, Self::Y, Self::Z];

    /// Position of the axis inside a triple.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::X => 0,
            Self::Y => 1,
            Self::Z => 2,
        }
    }
}

/// Set of axes touched by an update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AxisSet([bool; 3]);

impl AxisSet {
    /// No axes.
    pub const EMPTY: Self = Self([false; 3]);
    /// Every axis.
    pub const ALL: Self = Self([true; 3]);

    /// Adds an axis to the set.
    pub const fn insert(&mut self, axis: Axis) {
        self.0[axis.index()] = true;
    }

    /// Returns `true` if the axis is part of the set.
    #[must_use]
    pub const fn contains(self, axis: Axis) -> bool {
        self.0[axis.index()]
    }

    /// Returns `true` if no axis is present.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        !self.0[0] && !self.0[1] && !self.0[2]
    }

    /// Iterates the axes in positional order.
    pub fn iter(self) -> impl Iterator<Item = Axis> {
        Axis::ALL.into_iter().filter(move |axis| self.contains(*axis))
    }
}

/// Outcome of resolving one axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Resolution {
    /// The extent is known.
    Resolved(f32),
    /// The extent depends on a renderer answer that has not arrived yet.
    Pending,
}

impl Resolution {
    /// Returns the extent when resolved.
    #[must_use]
    pub const fn value(self) -> Option<f32> {
        match self {
            Self::Resolved(value) => Some(value),
            Self::Pending => None,
        }
    }

    /// Returns `true` while waiting on the renderer.
    #[must_use]
    pub const fn is_pending(self) -> bool {
        matches!(self, Self::Pending)
    }
}

/// Collapses a per-axis resolution into a triple, or `None` if any axis is pending.
#[must_use]
pub fn resolved_triple(size: [Resolution; 3]) -> Option<[f32; 3]> {
    Some([size[0].value()?, size[1].value()?, size[2].value()?])
}

/// Stored inputs for one axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisSize {
    /// Active mode.
    pub mode: SizeMode,
    /// Literal used in [`SizeMode::Absolute`].
    pub absolute: f32,
    /// Fraction used in [`SizeMode::Relative`].
    pub fraction: f32,
    /// Last renderer report, used in [`SizeMode::Render`].
    pub reported: Option<f32>,
}

impl Default for AxisSize {
    fn default() -> Self {
        Self {
            mode: SizeMode::Relative,
            absolute: 0.0,
            fraction: 1.0,
            reported: None,
        }
    }
}

/// Resolves one axis given the parent's resolution of the same axis.
///
/// `parent` is `None` for the root and for detached nodes, which makes a
/// relative axis pending rather than zero.
#[must_use]
pub fn resolve_axis(axis: &AxisSize, parent: Option<Resolution>) -> Resolution {
    match axis.mode {
        SizeMode::Absolute => Resolution::Resolved(axis.absolute),
        SizeMode::Relative => match parent {
            Some(Resolution::Resolved(extent)) => Resolution::Resolved(extent * axis.fraction),
            Some(Resolution::Pending) | None => Resolution::Pending,
        },
        SizeMode::Render => axis
            .reported
            .map_or(Resolution::Pending, Resolution::Resolved),
    }
}

/// Checks that every component is a finite, non-negative extent.
///
/// # Errors
///
/// Returns [`SceneError::InvalidOperation`] naming the first offending axis.
pub fn validate_extents(values: [f32; 3], what: &str) -> Result<[f32; 3]> {
    for axis in Axis::ALL {
        let value = values[axis.index()];
        if !value.is_finite() || value < 0.0 {
            return Err(SceneError::invalid(format!(
                "{what} on axis {axis:?} must be finite and non-negative, got {value}"
            )));
        }
    }
    Ok(values)
}

/// Size state owned by a node: inputs, per-axis cache and last emitted triple.
#[derive(Debug, Clone, Default)]
pub struct NodeSize {
    axes: [AxisSize; 3],
    cache: [Option<Resolution>; 3],
    emitted: Option<[f32; 3]>,
}

impl NodeSize {
    /// Returns the stored inputs of one axis.
    #[must_use]
    pub const fn axis(&self, axis: Axis) -> &AxisSize {
        &self.axes[axis.index()]
    }

    /// Returns the modes of all three axes.
    #[must_use]
    pub const fn modes(&self) -> [SizeMode; 3] {
        [self.axes[0].mode, self.axes[1].mode, self.axes[2].mode]
    }

    /// Applies new modes, returning the axes whose mode changed.
    ///
    /// Entering [`SizeMode::Render`] forgets the previous report so the axis
    /// waits for a fresh answer.
    pub fn set_modes(&mut self, modes: [SizeMode; 3]) -> AxisSet {
        let mut changed = AxisSet::EMPTY;
        for axis in Axis::ALL {
            let slot = &mut self.axes[axis.index()];
            let mode = modes[axis.index()];
            if slot.mode != mode {
                slot.mode = mode;
                if mode == SizeMode::Render {
                    slot.reported = None;
                }
                changed.insert(axis);
            }
        }
        changed
    }

    /// Stores absolute literals, returning the absolute-mode axes whose value changed.
    pub fn set_absolute(&mut self, values: [f32; 3]) -> AxisSet {
        self.store(values, SizeMode::Absolute, |axis| &mut axis.absolute)
    }

    /// Stores relative fractions, returning the relative-mode axes whose value changed.
    pub fn set_fraction(&mut self, values: [f32; 3]) -> AxisSet {
        self.store(values, SizeMode::Relative, |axis| &mut axis.fraction)
    }

    /// Stores a renderer report, returning the render-mode axes whose value changed.
    pub fn set_reported(&mut self, values: [f32; 3]) -> AxisSet {
        let mut changed = AxisSet::EMPTY;
        for axis in Axis::ALL {
            let slot = &mut self.axes[axis.index()];
            let value = Some(values[axis.index()]);
            if slot.reported != value {
                slot.reported = value;
                if slot.mode == SizeMode::Render {
                    changed.insert(axis);
                }
            }
        }
        changed
    }

    fn store(
        &mut self,
        values: [f32; 3],
        active: SizeMode,
        field: impl Fn(&mut AxisSize) -> &mut f32,
    ) -> AxisSet {
        let mut changed = AxisSet::EMPTY;
        for axis in Axis::ALL {
            let slot = &mut self.axes[axis.index()];
            let mode = slot.mode;
            let target = field(slot);
            let value = values[axis.index()];
            #[allow(clippy::float_cmp)]
            if *target != value {
                *target = value;
                if mode == active {
                    changed.insert(axis);
                }
            }
        }
        changed
    }

    /// Returns the cached resolution of an axis, `None` when stale.
    #[must_use]
    pub const fn cached(&self, axis: Axis) -> Option<Resolution> {
        self.cache[axis.index()]
    }

    /// Caches the resolution of an axis.
    pub const fn cache(&mut self, axis: Axis, resolution: Resolution) {
        self.cache[axis.index()] = Some(resolution);
    }

    /// Marks an axis stale.
    pub const fn invalidate(&mut self, axis: Axis) {
        self.cache[axis.index()] = None;
    }

    /// Returns `true` if the axis is resolved relative to the parent.
    #[must_use]
    pub fn depends_on_parent(&self, axis: Axis) -> bool {
        self.axes[axis.index()].mode == SizeMode::Relative
    }

    /// Triple most recently sent to the renderer.
    #[must_use]
    pub const fn emitted(&self) -> Option<[f32; 3]> {
        self.emitted
    }

    /// Records the triple sent to the renderer.
    pub const fn set_emitted(&mut self, size: Option<[f32; 3]>) {
        self.emitted = size;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn axis(mode: SizeMode) -> AxisSize {
        AxisSize {
            mode,
            absolute: 40.0,
            fraction: 0.5,
            reported: None,
        }
    }

    #[test]
    fn test_absolute_ignores_parent() {
        let axis = axis(SizeMode::Absolute);
        assert_eq!(resolve_axis(&axis, None), Resolution::Resolved(40.0));
        assert_eq!(
            resolve_axis(&axis, Some(Resolution::Pending)),
            Resolution::Resolved(40.0)
        );
        assert_eq!(
            resolve_axis(&axis, Some(Resolution::Resolved(900.0))),
            Resolution::Resolved(40.0)
        );
    }

    #[test]
    fn test_relative_scales_parent() {
        let axis = axis(SizeMode::Relative);
        assert_eq!(
            resolve_axis(&axis, Some(Resolution::Resolved(800.0))),
            Resolution::Resolved(400.0)
        );
        assert_eq!(
            resolve_axis(&axis, Some(Resolution::Pending)),
            Resolution::Pending
        );
        assert_eq!(resolve_axis(&axis, None), Resolution::Pending);
    }

    #[test]
    fn test_render_waits_for_report() {
        let mut axis = axis(SizeMode::Render);
        assert!(resolve_axis(&axis, Some(Resolution::Resolved(10.0))).is_pending());
        axis.reported = Some(12.5);
        assert_eq!(resolve_axis(&axis, None), Resolution::Resolved(12.5));
    }

    #[test]
    fn test_mode_codes() {
        for mode in [SizeMode::Relative, SizeMode::Absolute, SizeMode::Render] {
            assert_eq!(SizeMode::try_from(mode.code()), Ok(mode));
            assert_eq!(mode.to_string().parse::<SizeMode>(), Ok(mode));
        }
        assert!(matches!(
            SizeMode::try_from(7),
            Err(SceneError::InvalidSizeMode(_))
        ));
        assert!(matches!(
            "stretch".parse::<SizeMode>(),
            Err(SceneError::InvalidSizeMode(_))
        ));
    }

    #[test]
    fn test_validate_extents() {
        assert_eq!(validate_extents([1.0, 0.0, 3.0], "size"), Ok([1.0, 0.0, 3.0]));
        assert!(validate_extents([1.0, -0.5, 3.0], "size").is_err());
        assert!(validate_extents([f32::NAN, 0.0, 0.0], "size").is_err());
        assert!(validate_extents([0.0, 0.0, f32::INFINITY], "size").is_err());
    }

    #[test]
    fn test_inert_values_only_report_active_axes() {
        let mut size = NodeSize::default();
        let changed = size.set_absolute([10.0, 20.0, 30.0]);
        assert!(changed.is_empty());
        assert_eq!(size.axis(Axis::Y).absolute, 20.0);

        let changed = size.set_modes([SizeMode::Absolute, SizeMode::Relative, SizeMode::Relative]);
        assert_eq!(changed.iter().collect::<Vec<_>>(), vec![Axis::X]);

        let changed = size.set_absolute([11.0, 21.0, 30.0]);
        assert_eq!(changed.iter().collect::<Vec<_>>(), vec![Axis::X]);
    }

    #[test]
    fn test_entering_render_forgets_report() {
        let mut size = NodeSize::default();
        size.set_modes([SizeMode::Render; 3]);
        size.set_reported([5.0, 6.0, 7.0]);
        size.set_modes([SizeMode::Absolute; 3]);
        assert_eq!(size.axis(Axis::X).reported, Some(5.0));
        size.set_modes([SizeMode::Render; 3]);
        assert_eq!(size.axis(Axis::X).reported, None);
    }
}
