//! Deprecated directive names.

use super::{CadDirective, DirectiveBlock, DirectiveContext};
use crate::node::Node;
use crate::options::{DirectiveOptions, OptionKey};

/// Old directive name delegating to its replacement.
///
/// Each use logs a deprecation notice naming the replacement.
pub struct Legacy<D> {
    name: &'static str,
    inner: D,
}

impl<D: CadDirective> Legacy<D> {
    #[must_use]
    pub fn new(name: &'static str, inner: D) -> Self {
        Self { name, inner }
    }
}

impl<D: CadDirective> CadDirective for Legacy<D> {
    fn name(&self) -> &str {
        self.name
    }

    fn option_keys(&self) -> &[OptionKey] {
        self.inner.option_keys()
    }

    fn run(
        &mut self,
        block: &DirectiveBlock,
        options: &DirectiveOptions,
        ctx: &DirectiveContext,
    ) -> Vec<Node> {
        tracing::info!(
            path = %ctx.page_name(),
            line = ctx.line,
            "use of the {} directive is deprecated, replace \":::{}\" with \":::{}\"",
            self.name,
            self.name,
            self.inner.name()
        );
        self.inner.run(block, options, ctx)
    }

    fn warnings(&self) -> &[String] {
        self.inner.warnings()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directive::testing::{block, html, run, settings};
    use crate::directive::{SvgDirective, VtkDirective};
    use crate::geometry::Value;
    use crate::geometry::fixtures::cuboid;
    use crate::test_support::MockKernel;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_legacy_delegates_under_old_name() {
        let (settings, kernel) = settings(MockKernel::showing(Value::Shape(cuboid(1.0, 1.0, 1.0))));
        let mut directive = Legacy::new("cq_plot", SvgDirective::new(settings));

        let nodes = run(
            &mut directive,
            &block("cq_plot", "", "result = box()"),
            &DirectiveOptions::default(),
        );

        assert_eq!(directive.name(), "cq_plot");
        assert!(html(&nodes).contains("<svg"));
        assert_eq!(kernel.calls(), 1);
    }

    #[test]
    fn test_legacy_errors_name_old_directive() {
        let (settings, _) = settings(MockKernel::failing("boom"));
        let mut directive = Legacy::new("cadquery", VtkDirective::new(settings));

        let nodes = run(
            &mut directive,
            &block("cadquery", "", "result = box()"),
            &DirectiveOptions::default(),
        );

        assert!(html(&nodes).contains("Script error in cadquery directive:"));
        assert_eq!(directive.warnings().len(), 1);
        assert!(directive.option_keys().contains(&OptionKey::Height));
    }
}
