/*
 * @Author       : 老董
 * @Date         : 2026-10-14
 * @Description  : GAN 积木集成测试
 *                 验证：pix2pix 风格生成器中首层下采样与末层上采样的形状与取值范围，
 *                 以及编码器/解码器串联、保存/加载后的推理一致性
 */

use gan_ops::errors::ConfigurationError;
use gan_ops::nn::{
    Activation, DownsampleBlock, DownsampleConfig, Module, Padding, UpsampleBlock,
    UpsampleConfig, load_state, save_state,
};
use gan_ops::tensor::Tensor;

/// DownsampleBlock(filters=64, kernel_size=4, strides=2, padding="same",
/// apply_batchnorm=true, activation="relu") 作用于 (1,256,256,3) 得到 (1,128,128,64)
#[test]
fn test_downsample_first_generator_layer() -> Result<(), Box<dyn std::error::Error>> {
    let config = DownsampleConfig {
        filters: 64,
        kernel_size: 4,
        strides: 2,
        padding: "same".parse()?,
        apply_batchnorm: true,
        activation: "relu".parse()?,
        seed: Some(42),
    };
    let mut block = DownsampleBlock::new(config)?;

    let x = Tensor::new_random(0., 1., &[1, 256, 256, 3]);
    let y = block.forward(&x, true)?;
    assert_eq!(y.shape(), &[1, 128, 128, 64]);
    assert!(y.min().unwrap() >= 0.0);
    Ok(())
}

/// UpsampleBlock(filters=3, kernel_size=4, padding="same", apply_batchnorm=false,
/// activation="sigmoid") 作用于 (1,128,128,64) 得到 (1,256,256,3)，且取值都在 [0, 1]
#[test]
fn test_upsample_last_generator_layer() -> Result<(), Box<dyn std::error::Error>> {
    let config = UpsampleConfig::new(3, 4)
        .with_padding(Padding::Same)
        .with_batchnorm(false)
        .with_activation(Activation::Sigmoid);
    let mut block = UpsampleBlock::new(config)?;

    let x = Tensor::new_random(-1., 1., &[1, 128, 128, 64]);
    let y = block.forward(&x, true)?;
    assert_eq!(y.shape(), &[1, 256, 256, 3]);
    assert!(y.min().unwrap() >= 0.0);
    assert!(y.max().unwrap() <= 1.0);
    Ok(())
}

#[test]
fn test_activation_sets_differ_between_blocks() {
    let down = DownsampleBlock::new(
        DownsampleConfig::new(8, 4, 2).with_activation(Activation::Sigmoid),
    );
    assert!(matches!(
        down,
        Err(ConfigurationError::UnsupportedActivation { .. })
    ));

    let up = UpsampleBlock::new(UpsampleConfig::new(8, 4).with_activation(Activation::None));
    assert!(matches!(
        up,
        Err(ConfigurationError::UnsupportedActivation { .. })
    ));
}

/// 小型编码器/解码器：64 -> 32 -> 16 -> 32 -> 64
#[test]
fn test_encoder_decoder_chain() -> Result<(), Box<dyn std::error::Error>> {
    let mut encoder = vec![
        DownsampleBlock::new(
            DownsampleConfig::new(8, 4, 2)
                .with_batchnorm(false)
                .with_activation(Activation::LeakyRelu),
        )?,
        DownsampleBlock::new(DownsampleConfig::new(16, 4, 2).with_activation(Activation::LeakyRelu))?,
    ];
    let mut decoder = vec![
        UpsampleBlock::new(UpsampleConfig::new(8, 4))?,
        UpsampleBlock::new(
            UpsampleConfig::new(3, 4)
                .with_batchnorm(false)
                .with_activation(Activation::Sigmoid),
        )?,
    ];

    let x = Tensor::new_random(-1., 1., &[2, 64, 64, 3]);
    let mut h = x.clone();
    for block in encoder.iter_mut() {
        h = block.forward(&h, true)?;
    }
    assert_eq!(h.shape(), &[2, 16, 16, 16]);
    for block in decoder.iter_mut() {
        h = block.forward(&h, true)?;
    }
    assert_eq!(h.shape(), x.shape());
    assert!(h.min().unwrap() >= 0.0 && h.max().unwrap() <= 1.0);

    let total: usize = encoder.iter().map(Module::num_params).sum::<usize>()
        + decoder.iter().map(Module::num_params).sum::<usize>();
    assert_eq!(
        total,
        (4 * 4 * 3 * 8 + 8) + (4 * 4 * 8 * 16 + 2 * 16) + (4 * 4 * 8 * 16 + 2 * 8) + (4 * 4 * 3 * 8 + 3)
    );
    Ok(())
}

#[test]
fn test_inference_is_reproducible_after_reload() -> Result<(), Box<dyn std::error::Error>> {
    let config = UpsampleConfig::new(4, 4).with_seed(2024);
    let mut block = UpsampleBlock::new(config.clone())?;
    let x = Tensor::new_random(-1., 1., &[3, 6, 6, 5]);
    for _ in 0..3 {
        block.forward(&x, true)?;
    }

    let path = std::env::temp_dir().join(format!("gan_ops_it_{}.bin", std::process::id()));
    save_state(&block, &path)?;
    let mut reloaded = UpsampleBlock::new(config)?;
    load_state(&mut reloaded, &path)?;
    std::fs::remove_file(&path)?;

    // 推理模式是纯函数：重复调用、重新加载都给出相同结果
    let expected = block.forward(&x, false)?;
    assert_eq!(block.forward(&x, false)?, expected);
    assert_eq!(reloaded.forward(&x, false)?, expected);
    Ok(())
}
