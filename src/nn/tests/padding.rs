use crate::errors::{ConfigurationError, TensorError};
use crate::nn::Padding;

#[test]
fn test_padding_from_str() {
    assert_eq!("same".parse::<Padding>(), Ok(Padding::Same));
    assert_eq!("VALID".parse::<Padding>(), Ok(Padding::Valid));
    assert_eq!(
        "full".parse::<Padding>(),
        Err(ConfigurationError::UnknownPadding("full".to_string()))
    );
    assert_eq!(Padding::default(), Padding::Same);
    assert_eq!(Padding::Valid.to_string(), "valid");
}

#[test]
fn test_conv_output_len_same() {
    // same: ceil(n / s)
    assert_eq!(Padding::Same.conv_output_len(256, 4, 2), Ok(128));
    assert_eq!(Padding::Same.conv_output_len(5, 4, 2), Ok(3));
    assert_eq!(Padding::Same.conv_output_len(7, 3, 1), Ok(7));
    assert_eq!(Padding::Same.conv_output_len(1, 4, 2), Ok(1));
}

#[test]
fn test_conv_output_len_valid() {
    assert_eq!(Padding::Valid.conv_output_len(4, 2, 1), Ok(3));
    assert_eq!(Padding::Valid.conv_output_len(256, 4, 2), Ok(127));
    assert_eq!(Padding::Valid.conv_output_len(5, 5, 3), Ok(1));
    assert!(matches!(
        Padding::Valid.conv_output_len(3, 4, 1),
        Err(TensorError::InvalidOperation(_))
    ));
}

#[test]
fn test_conv_pad_before() {
    // 总填充为奇数时，多出的1个像素补在后侧
    assert_eq!(Padding::Same.conv_pad_before(4, 3, 2), 0);
    assert_eq!(Padding::Same.conv_pad_before(256, 4, 2), 1);
    assert_eq!(Padding::Same.conv_pad_before(5, 3, 1), 1);
    assert_eq!(Padding::Same.conv_pad_before(6, 1, 2), 0);
    assert_eq!(Padding::Valid.conv_pad_before(256, 4, 2), 0);
}

#[test]
fn test_conv_transpose_lengths() {
    assert_eq!(Padding::Same.conv_transpose_output_len(128, 4, 2), 256);
    assert_eq!(Padding::Valid.conv_transpose_output_len(2, 3, 2), 5);
    assert_eq!(Padding::Valid.conv_transpose_output_len(2, 1, 2), 4);

    assert_eq!(Padding::Same.conv_transpose_crop_before(4, 2), 1);
    assert_eq!(Padding::Same.conv_transpose_crop_before(3, 2), 0);
    assert_eq!(Padding::Same.conv_transpose_crop_before(1, 2), 0);
    assert_eq!(Padding::Valid.conv_transpose_crop_before(4, 2), 0);
}
