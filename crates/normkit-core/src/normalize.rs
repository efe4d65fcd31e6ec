//! Host-side normalization entry points.

use normkit_model::{Result, Value};

use crate::pipeline::Pipeline;
use crate::record::Record;

/// Normalization for a host type with one static pipeline.
///
/// ```ignore
/// static PIPELINE: LazyLock<Pipeline<Person>> = LazyLock::new(|| {
///     let mut pipeline = Pipeline::new();
///     pipeline.declare(&["name"], RuleOptions::new(), |env| env.unit("strip"))?;
///     pipeline
/// });
///
/// impl Normalize for Person {
///     fn pipeline() -> &'static Pipeline<Self> {
///         &PIPELINE
///     }
/// }
/// ```
pub trait Normalize: Record + Sized + 'static {
    fn pipeline() -> &'static Pipeline<Self>;

    fn normalized_attribute(&self, name: &str, context: Option<&str>) -> Result<Value> {
        Self::pipeline().attribute(self, name, context)
    }

    fn normalized(&self, context: Option<&str>) -> Result<Self> {
        Self::pipeline().normalize(self, context)
    }

    fn normalize_in_place(&mut self, context: Option<&str>) -> Result<()> {
        Self::pipeline().normalize_in_place(self, context)
    }

    fn is_normalized(&self, context: Option<&str>) -> bool {
        self.normalization().is_normalized(context)
    }
}
