//! Local section frames: rows are (chord, span, normal), right-handed,
//! so chord × span = normal.

use actuator_types::constants::{DEG2RAD, GEOMETRY_EPS, RAD2DEG};
use glam::{DMat3, DVec3};

/// Frame matrix from its three row vectors.
#[inline]
pub fn frame_from_rows(chord: DVec3, span: DVec3, normal: DVec3) -> DMat3 {
    DMat3::from_cols(chord, span, normal).transpose()
}

/// Orthonormal frame with the given span direction; the chord axis is the
/// component of `chord_hint` perpendicular to the span.
///
/// Returns `None` when the span is degenerate or parallel to the hint.
pub fn section_frame(chord_hint: DVec3, span: DVec3) -> Option<DMat3> {
    let s = span.try_normalize()?;
    let c_raw = chord_hint - chord_hint.dot(s) * s;
    if c_raw.length() <= GEOMETRY_EPS * chord_hint.length().max(1.0) {
        return None;
    }
    let c = c_raw.normalize();
    let n = c.cross(s);
    Some(frame_from_rows(c, s, n))
}

/// Nose-up rotation of the chord/normal pair about the span axis.
pub fn pitch_frame(frame: DMat3, angle_deg: f64) -> DMat3 {
    if angle_deg == 0.0 {
        return frame;
    }
    let (sin_t, cos_t) = (angle_deg * DEG2RAD).sin_cos();
    let c = frame.row(0);
    let s = frame.row(1);
    let n = frame.row(2);
    frame_from_rows(c * cos_t - n * sin_t, s, n * cos_t + c * sin_t)
}

/// Component of `u` in the chord-normal plane.
#[inline]
pub fn in_plane(frame: &DMat3, u: DVec3) -> DVec3 {
    let s = frame.row(1);
    u - u.dot(s) * s
}

/// Angle of attack (deg) of `u` measured from the chord toward the normal.
#[inline]
pub fn angle_of_attack(frame: &DMat3, u: DVec3) -> f64 {
    u.dot(frame.row(2)).atan2(u.dot(frame.row(0))) * RAD2DEG
}
