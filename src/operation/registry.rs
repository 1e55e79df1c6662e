use crate::model::{InputArity, Operation, ValueKind};
use ahash::AHashMap;
use std::sync::{Arc, LazyLock};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationCategory {
    Math,
    Statistics,
    Transform,
    Window,
    Arithmetic,
    Aggregate,
}

/// Registry entry for one `(name, arity)` pair.
#[derive(Debug, Clone, PartialEq)]
pub struct OperationSpec {
    pub name: String,
    pub arity: InputArity,
    pub category: OperationCategory,
    pub output_kind: ValueKind,
    pub supports_scalar_input: bool,
    pub default_label: String,
    pub params: Vec<(String, f64)>,
}

impl OperationSpec {
    /// The operation with this entry's default parameters.
    pub fn default_operation(&self) -> Operation {
        self.params
            .iter()
            .fold(Operation::named(self.name.clone()), |op, (name, value)| {
                op.with_param(name.clone(), *value)
            })
    }
}

/// Maps `(operation name, arity)` to its declared typing. The first entry registered for
/// an arity is that arity's default operation.
#[derive(Debug, Clone, Default)]
pub struct OperationRegistry {
    specs: AHashMap<(String, InputArity), OperationSpec>,
    defaults: AHashMap<InputArity, String>,
}

/// Master macro declaring the built-in operations, grouped by arity.
macro_rules! define_operations {
    ( $( $arity:ident => [ $( ($name:literal, $category:ident, $kind:ident, $scalar:literal, $label:literal, [ $( $param:literal = $default:literal ),* ]) ),* $(,)? ] ),* $(,)? ) => {
        fn builtin_operations() -> Vec<OperationSpec> {
            let mut specs = Vec::new();
            $( $(
                specs.push(OperationSpec {
                    name: $name.to_string(),
                    arity: InputArity::$arity,
                    category: OperationCategory::$category,
                    output_kind: ValueKind::$kind,
                    supports_scalar_input: $scalar,
                    default_label: $label.to_string(),
                    params: vec![ $( ($param.to_string(), $default) ),* ],
                });
            )* )*
            specs
        }
    };
}

define_operations! {
    Unary => [
        ("Abs", Math, Series, false, "Absolute", []),
        ("Sqrt", Math, Series, false, "Square Root", []),
        ("Log", Math, Series, false, "Logarithm", []),
        ("Negate", Math, Series, false, "Negate", []),
        ("CumSum", Transform, Series, false, "Cumulative Sum", []),
        ("Diff", Transform, Series, false, "Difference", ["periods" = 1.0]),
        ("PctChange", Transform, Series, false, "Percent Change", ["periods" = 1.0]),
        ("EMA", Window, Series, false, "EMA", ["span" = 20.0]),
        ("RollingMean", Window, Series, false, "Rolling Mean", ["window" = 20.0]),
        ("RollingStd", Window, Series, false, "Rolling Std", ["window" = 20.0]),
        ("Mean", Statistics, Scalar, false, "Mean", []),
        ("Sum", Statistics, Scalar, false, "Sum", []),
        ("Max", Statistics, Scalar, false, "Max", []),
        ("Min", Statistics, Scalar, false, "Min", []),
        ("Std", Statistics, Scalar, false, "Standard Deviation", []),
        ("Last", Statistics, Scalar, false, "Last Value", []),
    ],
    Binary => [
        ("Add", Arithmetic, Series, true, "Add", []),
        ("Subtract", Arithmetic, Series, true, "Subtract", []),
        ("Multiply", Arithmetic, Series, true, "Multiply", []),
        ("Divide", Arithmetic, Series, true, "Divide", []),
        ("Mod", Arithmetic, Series, true, "Modulo", []),
        ("Power", Arithmetic, Series, true, "Power", []),
        ("Maximum", Arithmetic, Series, true, "Maximum", []),
        ("Minimum", Arithmetic, Series, true, "Minimum", []),
        ("Correlation", Statistics, Scalar, false, "Correlation", []),
        ("Covariance", Statistics, Scalar, false, "Covariance", []),
    ],
    Nary => [
        ("Sum", Aggregate, Series, false, "Sum", []),
        ("Mean", Aggregate, Series, false, "Mean", []),
        ("Max", Aggregate, Series, false, "Max", []),
        ("Min", Aggregate, Series, false, "Min", []),
        ("Product", Aggregate, Series, false, "Product", []),
        ("Median", Aggregate, Series, false, "Median", []),
    ],
}

static STANDARD_REGISTRY: LazyLock<Arc<OperationRegistry>> = LazyLock::new(|| {
    Arc::new(
        builtin_operations()
            .into_iter()
            .fold(OperationRegistry::default(), OperationRegistry::with_operation),
    )
});

impl OperationRegistry {
    /// The built-in registry, initialised once per process and shared.
    pub fn standard() -> Arc<OperationRegistry> {
        Arc::clone(&STANDARD_REGISTRY)
    }

    /// Registers (or replaces) an operation.
    pub fn with_operation(mut self, spec: OperationSpec) -> Self {
        self.defaults
            .entry(spec.arity)
            .or_insert_with(|| spec.name.clone());
        self.specs.insert((spec.name.clone(), spec.arity), spec);
        self
    }

    pub fn lookup(&self, name: &str, arity: InputArity) -> Option<&OperationSpec> {
        self.specs.get(&(name.to_string(), arity))
    }

    pub fn default_for(&self, arity: InputArity) -> Option<&OperationSpec> {
        self.defaults
            .get(&arity)
            .and_then(|name| self.lookup(name, arity))
    }

    /// Declared output kind and scalar support, falling back to the conservative
    /// `(Series, false)` for names unknown under `arity`.
    pub fn typing(&self, name: &str, arity: InputArity) -> (ValueKind, bool) {
        self.lookup(name, arity)
            .map(|spec| (spec.output_kind, spec.supports_scalar_input))
            .unwrap_or((ValueKind::Series, false))
    }

    /// The label a fresh output of this operation is named after.
    pub fn default_label(&self, name: &str, arity: InputArity) -> String {
        self.lookup(name, arity)
            .map(|spec| spec.default_label.clone())
            .unwrap_or_else(|| name.to_string())
    }

    pub fn operations(&self, arity: InputArity) -> Vec<&OperationSpec> {
        let mut specs: Vec<&OperationSpec> =
            self.specs.values().filter(|s| s.arity == arity).collect();
        specs.sort_by(|a, b| a.name.cmp(&b.name));
        specs
    }
}
