mod init;
mod layer_conv_transpose2d;
mod padding;
