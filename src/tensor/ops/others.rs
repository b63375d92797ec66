use crate::tensor::Tensor;

impl Tensor {
    /// 逐元素应用`f`，返回新张量
    pub fn map<F: Fn(f32) -> f32>(&self, f: F) -> Tensor {
        Tensor {
            data: self.data.mapv(f),
        }
    }

    /// 逐元素原地应用`f`
    pub fn map_inplace<F: Fn(f32) -> f32>(&mut self, f: F) {
        self.data.mapv_inplace(f);
    }

    /// 所有元素中的最小值；空张量返回`None`
    pub fn min(&self) -> Option<f32> {
        self.data.iter().copied().reduce(f32::min)
    }

    /// 所有元素中的最大值；空张量返回`None`
    pub fn max(&self) -> Option<f32> {
        self.data.iter().copied().reduce(f32::max)
    }
}
