//! Script evaluation entry point.

use crate::kernel::{Evaluation, Kernel, KernelFailure};

/// Run `source` through `kernel`.
///
/// Every call re-executes the script. A kernel failure is returned as-is so
/// callers can quote its diagnostic.
///
/// # Errors
///
/// Returns the kernel's [`KernelFailure`] when the script does not build.
pub fn evaluate(kernel: &dyn Kernel, source: &str) -> Result<Evaluation, KernelFailure> {
    tracing::debug!(bytes = source.len(), "Evaluating script");

    let evaluation = kernel.build(source)?;

    tracing::debug!(
        bindings = evaluation.env.len(),
        shown = evaluation.first_result.is_some(),
        "Script evaluated"
    );
    Ok(evaluation)
}
