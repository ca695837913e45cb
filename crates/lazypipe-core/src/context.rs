//! Shared, read-only settings carried by every stage of a pipeline chain.

use std::fmt;
use std::rc::Rc;

use crate::accessor::{Accessor, PathAccessor};
use crate::budget::BufferBudget;
use crate::config::PipeConfig;

#[derive(Clone)]
pub struct Context {
    accessor: Rc<dyn Accessor>,
    config: Rc<PipeConfig>,
}

impl Context {
    pub fn new(config: PipeConfig) -> Self {
        Self {
            accessor: Rc::new(PathAccessor),
            config: Rc::new(config),
        }
    }

    pub fn with_accessor(mut self, accessor: impl Accessor + 'static) -> Self {
        self.accessor = Rc::new(accessor);
        self
    }

    pub fn accessor(&self) -> &dyn Accessor {
        self.accessor.as_ref()
    }

    pub fn config(&self) -> &PipeConfig {
        &self.config
    }

    pub fn budget(&self) -> BufferBudget {
        self.config.budget()
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new(PipeConfig::default())
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
