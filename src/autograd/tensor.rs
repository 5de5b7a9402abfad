//! Tensor with shared storage and gradient tracking

use super::backward::{self, BackwardOp};
use ndarray::Array1;
use std::cell::{Ref, RefCell, RefMut};
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};

static NEXT_ID: AtomicUsize = AtomicUsize::new(0);

pub(crate) type GradCell = Rc<RefCell<Option<Array1<f32>>>>;

/// Flat `f32` tensor participating in the autograd graph
///
/// Storage is shared: cloning a tensor yields a handle onto the same data and
/// gradient buffers. A model keeps its parameters, the optimizer updates them
/// and callbacks snapshot or restore them, all through the same handles.
/// Shapes are not stored; operations receive their dimensions explicitly.
#[derive(Clone)]
pub struct Tensor {
    id: usize,
    data: Rc<RefCell<Array1<f32>>>,
    grad: GradCell,
    requires_grad: bool,
    backward_op: Option<Rc<dyn BackwardOp>>,
}

impl Tensor {
    /// Create a tensor from an ndarray
    pub fn new(data: Array1<f32>, requires_grad: bool) -> Self {
        Self {
            id: NEXT_ID.fetch_add(1, Ordering::Relaxed),
            data: Rc::new(RefCell::new(data)),
            grad: Rc::new(RefCell::new(None)),
            requires_grad,
            backward_op: None,
        }
    }

    /// Create a tensor from a vector
    pub fn from_vec(data: Vec<f32>, requires_grad: bool) -> Self {
        Self::new(Array1::from(data), requires_grad)
    }

    /// Tensor of zeros
    pub fn zeros(len: usize, requires_grad: bool) -> Self {
        Self::new(Array1::zeros(len), requires_grad)
    }

    /// Tensor of ones
    pub fn ones(len: usize, requires_grad: bool) -> Self {
        Self::new(Array1::ones(len), requires_grad)
    }

    /// Unique node identifier
    pub fn id(&self) -> usize {
        self.id
    }

    /// Borrow the data
    pub fn data(&self) -> Ref<'_, Array1<f32>> {
        self.data.borrow()
    }

    /// Mutably borrow the data
    pub fn data_mut(&self) -> RefMut<'_, Array1<f32>> {
        self.data.borrow_mut()
    }

    /// Replace the data, keeping the buffer shared with every handle
    pub fn set_data(&self, data: Array1<f32>) {
        *self.data.borrow_mut() = data;
    }

    /// Copy of the data as a vector
    pub fn to_vec(&self) -> Vec<f32> {
        self.data.borrow().to_vec()
    }

    /// Number of elements
    pub fn len(&self) -> usize {
        self.data.borrow().len()
    }

    /// Whether the tensor holds no elements
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// First element, used for scalar losses
    pub fn item(&self) -> f32 {
        self.data.borrow().first().copied().unwrap_or(0.0)
    }

    /// Whether gradients flow into this tensor
    pub fn requires_grad(&self) -> bool {
        self.requires_grad
    }

    /// Copy of the gradient, if any
    pub fn grad(&self) -> Option<Array1<f32>> {
        self.grad.borrow().clone()
    }

    /// Overwrite the gradient
    pub fn set_grad(&self, grad: Array1<f32>) {
        *self.grad.borrow_mut() = Some(grad);
    }

    /// Clear the gradient
    pub fn zero_grad(&self) {
        *self.grad.borrow_mut() = None;
    }

    /// Add into the gradient buffer
    pub fn accumulate_grad(&self, grad: Array1<f32>) {
        let mut slot = self.grad.borrow_mut();
        match slot.as_mut() {
            Some(existing) => *existing += &grad,
            None => *slot = Some(grad),
        }
    }

    pub(crate) fn grad_cell(&self) -> GradCell {
        Rc::clone(&self.grad)
    }

    /// Backward op that produced this tensor
    pub fn backward_op(&self) -> Option<Rc<dyn BackwardOp>> {
        self.backward_op.clone()
    }

    pub(crate) fn set_backward_op(&mut self, op: Rc<dyn BackwardOp>) {
        self.backward_op = Some(op);
    }

    /// New leaf holding a copy of the data, cut from the graph
    pub fn detach(&self) -> Self {
        Self::new(self.data.borrow().clone(), false)
    }

    /// Back-propagate from this (scalar) tensor
    pub fn backward(&self) {
        backward::run(self, None);
    }

    /// Back-propagate with an explicit output gradient
    pub fn backward_with(&self, grad_output: Array1<f32>) {
        backward::run(self, Some(grad_output));
    }
}

impl fmt::Debug for Tensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tensor")
            .field("id", &self.id)
            .field("len", &self.len())
            .field("requires_grad", &self.requires_grad)
            .field("has_grad", &self.grad.borrow().is_some())
            .finish()
    }
}
