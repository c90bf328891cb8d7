pub mod linear_test;
pub mod conv2d_test;
