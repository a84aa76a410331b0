const MAGIC: u32 = 0x5f37_59df;

/// Fast inverse square root: bit-level first guess refined by one Newton-Raphson iteration.
///
/// Relative error is below 0.2% for positive normal inputs. The result for `0.0` is a huge
/// meaningless value (about 2e19), so callers must not rely on it for zero-length vectors.
/// See <http://en.wikipedia.org/wiki/Fast_inverse_square_root>.
#[inline]
pub fn inv_sqrt(x: f32) -> f32 {
	let half_x = 0.5 * x;
	let y = f32::from_bits(MAGIC.wrapping_sub(x.to_bits() >> 1));
	y * (1.5 - half_x * y * y)
}
