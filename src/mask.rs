use bytes::BytesMut;

/// Mask or unmask `buf` in place, with `mask[0]` applied to `buf[0]`.
///
/// XOR is its own inverse, so the same call undoes a previous one.
#[inline]
pub fn apply_mask(buf: &mut [u8], mask: [u8; 4]) {
    let mask_u32 = u32::from_ne_bytes(mask);

    let mut words = buf.chunks_exact_mut(4);
    for word in &mut words {
        let masked = u32::from_ne_bytes([word[0], word[1], word[2], word[3]]) ^ mask_u32;
        word.copy_from_slice(&masked.to_ne_bytes());
    }
    // the remainder starts on a multiple of 4, so the key realigns at mask[0]
    apply_mask_bytewise(words.into_remainder(), mask);
}

/// Appends `payload` to `dst` masked with `mask`, leaving `payload` untouched.
#[inline]
pub fn extend_masked(dst: &mut BytesMut, payload: &[u8], mask: [u8; 4]) {
    let start = dst.len();
    dst.extend_from_slice(payload);
    apply_mask(&mut dst[start..], mask);
}

#[inline]
fn apply_mask_bytewise(buf: &mut [u8], mask: [u8; 4]) {
    for (i, byte) in buf.iter_mut().enumerate() {
        *byte ^= mask[i & 3];
    }
}
