//! Semantic landmark indices of the 468-point face mesh convention.
//!
//! "Left" and "right" are image-space: the left eye is the one with the smaller x in a
//! non-mirrored frame.

/// Number of points in a full face mesh.
pub const LANDMARK_COUNT: usize = 468;

pub const NOSE_TIP: usize = 1;
pub const FOREHEAD_TOP: usize = 10;
pub const UPPER_LIP_CENTER: usize = 13;
pub const LOWER_LIP_CENTER: usize = 14;
pub const LEFT_EYE_OUTER: usize = 33;
pub const LEFT_MOUTH_CORNER: usize = 61;
pub const CHIN_BOTTOM: usize = 152;
pub const LEFT_EYE_TOP: usize = 159;
pub const RIGHT_EYE_OUTER: usize = 263;
pub const RIGHT_MOUTH_CORNER: usize = 291;
pub const RIGHT_EYE_TOP: usize = 386;

pub const LEFT_EYE: [usize; 16] = [
    33, 7, 163, 144, 145, 153, 154, 155, 133, 173, 157, 158, 159, 160, 161, 246,
];

pub const RIGHT_EYE: [usize; 16] = [
    263, 249, 390, 373, 374, 380, 381, 382, 362, 398, 384, 385, 386, 387, 388, 466,
];

pub const LIPS: [usize; 40] = [
    61, 146, 91, 181, 84, 17, 314, 405, 321, 375, 291, 185, 40, 39, 37, 0, 267, 269, 270, 409,
    78, 95, 88, 178, 87, 14, 317, 402, 318, 324, 308, 191, 80, 81, 82, 13, 312, 311, 310, 415,
];

/// Subset of [`LIPS`] that follows the jaw.
pub const LOWER_LIP: [usize; 18] = [
    146, 91, 181, 84, 17, 314, 405, 321, 375, 95, 88, 178, 87, 14, 317, 402, 318, 324,
];

pub const LEFT_BROW: [usize; 10] = [70, 63, 105, 66, 107, 55, 65, 52, 53, 46];

pub const RIGHT_BROW: [usize; 10] = [300, 293, 334, 296, 336, 285, 295, 282, 283, 276];

/// Whether `index` belongs to an eye or lip group.
pub fn is_feature_landmark(index: usize) -> bool {
    LEFT_EYE.contains(&index) || RIGHT_EYE.contains(&index) || LIPS.contains(&index)
}
