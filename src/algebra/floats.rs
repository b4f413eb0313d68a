#![allow(non_snake_case)]
use num_traits::{Float, FromPrimitive, NumAssign};
use std::fmt::{Debug, Display, LowerExp};

/// Core trait for floating point values held in sparse storage.
///
/// All matrix coefficients, pivots and right hand sides in `dss` are
/// represented internally on values implementing `FloatT`, with the
/// native `f32` and `f64` types covered by a blanket implementation.
/// Any other type satisfying the bounds below should also work.
///
/// `FloatT` relies on [`num_traits`](num_traits) for most of its constituent
/// trait bounds.  `Send + Sync` are required so that independent block
/// products can be dispatched to worker threads.
pub trait FloatT:
    'static
    + Send
    + Sync
    + Float
    + NumAssign
    + Default
    + FromPrimitive
    + Display
    + LowerExp
    + Debug
    + Sized
{
}

impl<T> FloatT for T where
    T: 'static
        + Send
        + Sync
        + Float
        + NumAssign
        + Default
        + FromPrimitive
        + Display
        + LowerExp
        + Debug
        + Sized
{
}

/// Trait for converting Rust primitives to [`FloatT`](crate::algebra::FloatT)
///
/// This convenience trait is implemented on f32/64 and u32/64/usize.  It is
/// used internally for converting constant primitives, and by the
/// [settings](crate::dss::DssSettings) for converting defaults of
/// primitive type to [`FloatT`](crate::algebra::FloatT).

// NB: `AsFloatT` lets us write (1e-30).as_T() on constants
// rather than T::from_f64(1e-30).unwrap() everywhere
pub trait AsFloatT<T>: 'static {
    fn as_T(&self) -> T;
}

macro_rules! impl_as_FloatT {
    ($ty:ty, $ident:ident) => {
        impl<T> AsFloatT<T> for $ty
        where
            T: std::ops::Mul<T, Output = T> + FromPrimitive + 'static,
        {
            #[inline]
            fn as_T(&self) -> T {
                T::$ident(*self).unwrap()
            }
        }
    };
}
impl_as_FloatT!(u32, from_u32);
impl_as_FloatT!(u64, from_u64);
impl_as_FloatT!(usize, from_usize);
impl_as_FloatT!(f32, from_f32);
impl_as_FloatT!(f64, from_f64);
