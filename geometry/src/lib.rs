//! Geometry & pixel primitives
//!
//! `Size<T>` / `Point<T>` / `Rect<T>` are the vocabulary types every
//! other OpenKneeboard crate builds on: pixel buffers, content
//! sub-rects, VR layer placement, and sprite-batch source/destination
//! rects are all expressed in terms of these three generics.
//!
//! Austin Shafer - 2020 (style); OpenKneeboard contributors - geometry
use num_traits::{Float, NumCast, ToPrimitive, Zero};
use std::ops::{Add, Div, Mul, Sub};
use utils::ArithmeticError;

/// A 2D point, generic over an integral or floating coordinate type.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Hash)]
pub struct Point<T> {
    pub x: T,
    pub y: T,
}

impl<T> Point<T> {
    pub fn new(x: T, y: T) -> Self {
        Point { x, y }
    }
}

impl<T: Add<Output = T>> Add for Point<T> {
    type Output = Point<T>;
    fn add(self, rhs: Point<T>) -> Point<T> {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl<T: Sub<Output = T>> Sub for Point<T> {
    type Output = Point<T>;
    fn sub(self, rhs: Point<T>) -> Point<T> {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

/// A width/height pair.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Hash)]
pub struct Size<T> {
    pub width: T,
    pub height: T,
}

/// How `ScaledToFit` is allowed to change a `Size` relative to its
/// container.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ScaleToFitMode {
    /// Scale up or down, whichever is needed to fit.
    ShrinkOrGrow,
    /// Never scale past the content's native size.
    ShrinkOnly,
    /// Never scale below the content's native size.
    GrowOnly,
}

/// Which corner a `Rect`'s `origin` is measured from. Flipping between
/// the two negates (mirrors) the Y axis against a container height
///.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Origin {
    TopLeft,
    BottomLeft,
}

impl<T> Size<T> {
    pub fn new(width: T, height: T) -> Self {
        Size { width, height }
    }
}

impl<T: PartialEq + Zero + Copy> Size<T> {
    /// True iff either dimension is zero.
    pub fn is_empty(&self) -> bool {
        self.width == T::zero() || self.height == T::zero()
    }
}

impl<T> Size<T>
where
    T: Copy + PartialOrd + Mul<Output = T> + Div<Output = T> + Zero,
{
    /// True iff `self` fits within `container` on both axes.
    pub fn fits(&self, container: &Size<T>) -> bool {
        self.width <= container.width && self.height <= container.height
    }
}

impl<T> Size<T>
where
    T: Float,
{
    /// Scale `self` to fit inside `container`, preserving aspect
    /// ratio, per `mode`.
    ///
    /// This is the floating-point core; `IntegerScaledToFit` below
    /// builds on it by rounding.
    pub fn scaled_to_fit(&self, container: Size<T>, mode: ScaleToFitMode) -> Size<T> {
        if self.width <= T::zero() || self.height <= T::zero() {
            return Size::new(T::zero(), T::zero());
        }

        let width_ratio = container.width / self.width;
        let height_ratio = container.height / self.height;
        let mut ratio = if width_ratio < height_ratio {
            width_ratio
        } else {
            height_ratio
        };

        match mode {
            ScaleToFitMode::ShrinkOrGrow => {}
            ScaleToFitMode::ShrinkOnly => {
                if ratio > T::one() {
                    ratio = T::one();
                }
            }
            ScaleToFitMode::GrowOnly => {
                if ratio < T::one() {
                    ratio = T::one();
                }
            }
        }

        Size::new(self.width * ratio, self.height * ratio)
    }
}

impl Size<i32> {
    /// Integer variant of `ScaledToFit`: does the ratio computation in
    /// floating point, then rounds back to whole pixels. The result is
    /// still guaranteed to fit (never rounds up past the container on
    /// the limiting axis).
    pub fn integer_scaled_to_fit(&self, container: Size<i32>, mode: ScaleToFitMode) -> Size<i32> {
        let scaled = Size::new(self.width as f64, self.height as f64)
            .scaled_to_fit(Size::new(container.width as f64, container.height as f64), mode);

        let mut out = Size::new(scaled.width.round() as i32, scaled.height.round() as i32);
        // Rounding can push us 1px past the container on the
        // constraining axis; pull back in rather than violate `fits`.
        if out.width > container.width {
            out.width = container.width;
        }
        if out.height > container.height {
            out.height = container.height;
        }
        out
    }
}

/// Generic lossless numeric cast, used by `Rounded`/`StaticCast`
///.
pub fn checked_cast<T, U>(value: T) -> Result<U, ArithmeticError>
where
    T: ToPrimitive + Copy,
    U: NumCast,
{
    NumCast::from(value).ok_or_else(|| ArithmeticError::Overflow(value.to_i64().unwrap_or(-1)))
}

impl<T: Copy + ToPrimitive> Size<T> {
    /// Rounds (for floating source types) and casts to `U`, failing
    /// with `ArithmeticError` if the result doesn't fit in `U`.
    pub fn static_cast<U: NumCast>(&self) -> Result<Size<U>, ArithmeticError> {
        Ok(Size::new(
            checked_cast(self.width)?,
            checked_cast(self.height)?,
        ))
    }
}

impl Size<f32> {
    /// Round a floating size to the nearest integer pixel size.
    pub fn rounded(&self) -> Size<i32> {
        Size::new(self.width.round() as i32, self.height.round() as i32)
    }
}

/// A rectangle: an origin point plus a size. The `Origin` tag is not
/// stored on the type (it would prevent deriving `PartialEq` cleanly
/// across call sites that don't care); instead `with_origin` below
/// takes the source/target tags as parameters, matching how the
/// original engine threads the coordinate convention through call
/// sites rather than carrying it on the value.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Hash)]
pub struct Rect<T> {
    pub origin: Point<T>,
    pub size: Size<T>,
}

impl<T: Copy> Rect<T> {
    pub fn new(origin: Point<T>, size: Size<T>) -> Self {
        Rect { origin, size }
    }

    pub fn from_xywh(x: T, y: T, width: T, height: T) -> Self {
        Rect::new(Point::new(x, y), Size::new(width, height))
    }
}

impl<T: PartialEq + Zero + Copy> Rect<T> {
    pub fn is_empty(&self) -> bool {
        self.size.is_empty()
    }
}

impl<T> Rect<T>
where
    T: Copy + PartialOrd + Add<Output = T>,
{
    pub fn right(&self) -> T {
        self.origin.x + self.size.width
    }

    pub fn bottom(&self) -> T {
        self.origin.y + self.size.height
    }

    /// True iff `self` lies entirely within `container`.
    pub fn is_inside(&self, container: &Rect<T>) -> bool {
        self.origin.x >= container.origin.x
            && self.origin.y >= container.origin.y
            && self.right() <= container.right()
            && self.bottom() <= container.bottom()
    }
}

impl Rect<f32> {
    /// Clamp `self` to lie entirely within `container`. Shrinks
    /// the rect rather than just translating it, so the result is
    /// always `is_inside(container)`.
    pub fn clamped(&self, container: &Rect<f32>) -> Rect<f32> {
        let x0 = self.origin.x.max(container.origin.x);
        let y0 = self.origin.y.max(container.origin.y);
        let x1 = self.right().min(container.right());
        let y1 = self.bottom().min(container.bottom());

        let width = (x1 - x0).max(0.0);
        let height = (y1 - y0).max(0.0);

        Rect::from_xywh(x0, y0, width, height)
    }

    /// Re-express `self`, currently measured from `from`, in terms of
    /// `to`'s origin convention within a container of the given
    /// height. Flipping between `TopLeft` and `BottomLeft` mirrors Y:
    /// `new_y = container_height - old_y - height`.
    pub fn with_origin(&self, from: Origin, to: Origin, container_height: f32) -> Rect<f32> {
        if from == to {
            return *self;
        }
        Rect::from_xywh(
            self.origin.x,
            container_height - self.origin.y - self.size.height,
            self.size.width,
            self.size.height,
        )
    }
}

impl Rect<i32> {
    pub fn clamped(&self, container: &Rect<i32>) -> Rect<i32> {
        let x0 = self.origin.x.max(container.origin.x);
        let y0 = self.origin.y.max(container.origin.y);
        let x1 = self.right().min(container.right());
        let y1 = self.bottom().min(container.bottom());

        let width = (x1 - x0).max(0);
        let height = (y1 - y0).max(0);

        Rect::from_xywh(x0, y0, width, height)
    }

    pub fn with_origin(&self, from: Origin, to: Origin, container_height: i32) -> Rect<i32> {
        if from == to {
            return *self;
        }
        Rect::from_xywh(
            self.origin.x,
            container_height - self.origin.y - self.size.height,
            self.size.width,
            self.size.height,
        )
    }
}

/// Integer pixel size, as used by the SHM layout, sprite batch and
/// page-source preferred sizes.
pub type PixelSize = Size<i32>;
/// Integer pixel rect, as used for full-canvas/content sub-rects
///.
pub type PixelRect = Rect<i32>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn is_empty_iff_either_dimension_zero() {
        assert!(Size::new(0i32, 10).is_empty());
        assert!(Size::new(10i32, 0).is_empty());
        assert!(!Size::new(10i32, 10).is_empty());
    }

    #[test]
    fn scaled_to_fit_preserves_aspect_and_fits() {
        let content = Size::new(1920.0_f32, 1080.0_f32);
        let container = Size::new(800.0_f32, 800.0_f32);
        let scaled = content.scaled_to_fit(container, ScaleToFitMode::ShrinkOrGrow);

        assert!(scaled.fits(&container));
        let content_ratio = content.width / content.height;
        let scaled_ratio = scaled.width / scaled.height;
        assert!((content_ratio - scaled_ratio).abs() < 0.01);
    }

    #[test]
    fn integer_scaled_to_fit_never_exceeds_container() {
        for w in [1, 3, 7, 101, 1920] {
            for h in [1, 3, 7, 101, 1080] {
                let content = Size::new(w, h);
                let container = Size::new(256, 256);
                let scaled = content.integer_scaled_to_fit(container, ScaleToFitMode::ShrinkOrGrow);
                assert!(scaled.fits(&container), "{:?} did not fit in {:?}", scaled, container);
            }
        }
    }

    #[test]
    fn shrink_only_never_grows_past_native_size() {
        let small = Size::new(50.0_f32, 50.0_f32);
        let container = Size::new(800.0_f32, 800.0_f32);
        let scaled = small.scaled_to_fit(container, ScaleToFitMode::ShrinkOnly);
        assert!(scaled.width <= small.width && scaled.height <= small.height);
    }

    #[test]
    fn grow_only_never_shrinks_below_native_size() {
        let big = Size::new(2000.0_f32, 2000.0_f32);
        let container = Size::new(800.0_f32, 800.0_f32);
        let scaled = big.scaled_to_fit(container, ScaleToFitMode::GrowOnly);
        assert!(scaled.width >= big.width && scaled.height >= big.height);
    }

    #[test]
    fn clamped_rect_is_always_inside_container() {
        let container = Rect::from_xywh(0.0_f32, 0.0, 100.0, 100.0);
        let cases = [
            Rect::from_xywh(-10.0, -10.0, 50.0, 50.0),
            Rect::from_xywh(50.0, 50.0, 100.0, 100.0),
            Rect::from_xywh(10.0, 10.0, 10.0, 10.0),
        ];
        for r in cases {
            assert!(r.clamped(&container).is_inside(&container));
        }
    }

    #[test]
    fn with_origin_flips_y_around_container_height() {
        let r = Rect::from_xywh(10.0_f32, 20.0, 30.0, 40.0);
        let flipped = r.with_origin(Origin::TopLeft, Origin::BottomLeft, 200.0);
        assert_eq!(flipped.origin.y, 200.0 - 20.0 - 40.0);
        // flipping twice returns the original
        let back = flipped.with_origin(Origin::BottomLeft, Origin::TopLeft, 200.0);
        assert_eq!(back, r);
    }

    #[test]
    fn static_cast_is_lossless_or_errors() {
        let s = Size::new(10i64, 20i64);
        let cast: Size<i32> = s.static_cast().unwrap();
        assert_eq!(cast, Size::new(10i32, 20i32));

        let too_big = Size::new(i64::MAX, 0i64);
        assert!(too_big.static_cast::<i32>().is_err());
    }
}
