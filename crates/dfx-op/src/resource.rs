use std::fmt;

use dfx_tensor::ComputeBackend;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::error::{OpError, Result};

/// Auxiliary resources a node may ask the engine to provide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceRequest {
    /// Scratch memory, valid for the duration of one compute call.
    TempSpace,
    /// A seeded random number generator.
    Random,
}

impl fmt::Display for ResourceRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceRequest::TempSpace => write!(f, "temp_space"),
            ResourceRequest::Random => write!(f, "random"),
        }
    }
}

/// Scratch buffer handed to a kernel. Grows on demand and never shrinks.
#[derive(Debug, Default)]
pub struct TempSpace {
    buf: Vec<f32>,
}

impl TempSpace {
    pub fn new() -> Self {
        TempSpace::default()
    }

    /// Borrow at least `len` f32 slots of scratch memory.
    ///
    /// Contents are unspecified; callers must initialize what they read.
    pub fn get_space_f32(&mut self, len: usize) -> &mut [f32] {
        if self.buf.len() < len {
            self.buf.resize(len, 0.0);
        }
        &mut self.buf[..len]
    }

    pub fn capacity(&self) -> usize {
        self.buf.len()
    }
}

/// A materialized resource, matching one [`ResourceRequest`].
#[derive(Debug)]
pub enum Resource {
    TempSpace(TempSpace),
    Random(StdRng),
}

impl Resource {
    pub fn kind(&self) -> ResourceRequest {
        match self {
            Resource::TempSpace(_) => ResourceRequest::TempSpace,
            Resource::Random(_) => ResourceRequest::Random,
        }
    }
}

/// Everything a kernel receives from the engine besides its tensors.
#[derive(Debug)]
pub struct OpContext<'a> {
    pub backend: &'a dyn ComputeBackend,
    pub is_train: bool,
    /// Materialized resources, in the order the node requested them.
    pub requested: Vec<Resource>,
}

impl<'a> OpContext<'a> {
    /// Build a context whose resources match `requests` one-for-one.
    ///
    /// `seed` initializes every `Random` resource.
    pub fn materialize(
        backend: &'a dyn ComputeBackend,
        requests: &[ResourceRequest],
        seed: u64,
    ) -> Self {
        let requested = requests
            .iter()
            .map(|req| match req {
                ResourceRequest::TempSpace => Resource::TempSpace(TempSpace::new()),
                ResourceRequest::Random => Resource::Random(StdRng::seed_from_u64(seed)),
            })
            .collect();
        OpContext {
            backend,
            is_train: false,
            requested,
        }
    }

    pub fn with_train(mut self, is_train: bool) -> Self {
        self.is_train = is_train;
        self
    }

    /// The first requested scratch buffer.
    pub fn requested_temp_space(&mut self) -> Result<&mut TempSpace> {
        self.requested
            .iter_mut()
            .find_map(|r| match r {
                Resource::TempSpace(space) => Some(space),
                _ => None,
            })
            .ok_or_else(|| OpError::MissingResource(ResourceRequest::TempSpace.to_string()))
    }
}
