use std::fmt;

use smol_str::SmolStr;
use thiserror::Error;

type KindName = SmolStr;
type FieldName = SmolStr;
type TypeName = SmolStr;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("\"{0}\" is abstract and cannot be instantiated")]
    AbstractInstantiation(KindName),
    #[error("Too many arguments for \"{kind}\", expected {expected}, got {got}")]
    Arity {
        kind: KindName,
        expected: usize,
        got: usize,
    },
    #[error("Unexpected keyword argument \"{keyword}\" for \"{kind}\"")]
    UnexpectedKeyword { kind: KindName, keyword: FieldName },
    #[error("Missing value for field \"{field}\" of \"{kind}\"")]
    MissingField { kind: KindName, field: FieldName },
    #[error("No conversion from {from} to {to}")]
    ConversionNotFound { to: TypeName, from: TypeName },
    #[error("No handler registered for \"{0}\"")]
    UnsupportedExpression(KindName),
    #[error("Division by zero")]
    DivisionByZero,
    #[error("Matrix is singular")]
    SingularMatrix,
    #[error("Kind \"{0}\" is already registered")]
    DuplicateKind(KindName),
    #[error("\"{kind}\" has no output \"{output}\"")]
    UnknownOutput { kind: KindName, output: FieldName },
    #[error("Field \"{field}\" shadows a field of an ancestor of \"{kind}\"")]
    FieldShadowsAncestor { kind: KindName, field: FieldName },
}

impl miette::Diagnostic for Error {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        let code = match self {
            Error::AbstractInstantiation(_) => "exir::abstract_instantiation",
            Error::Arity { .. } => "exir::arity",
            Error::UnexpectedKeyword { .. } => "exir::unexpected_keyword",
            Error::MissingField { .. } => "exir::missing_field",
            Error::ConversionNotFound { .. } => "exir::conversion_not_found",
            Error::UnsupportedExpression(_) => "exir::unsupported_expression",
            Error::DivisionByZero => "exir::division_by_zero",
            Error::SingularMatrix => "exir::singular_matrix",
            Error::DuplicateKind(_) => "exir::duplicate_kind",
            Error::UnknownOutput { .. } => "exir::unknown_output",
            Error::FieldShadowsAncestor { .. } => "exir::field_shadows_ancestor",
        };
        Some(Box::new(code))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        let help: &str = match self {
            Error::AbstractInstantiation(_) => {
                "construct a concrete descendant, or convert a value through the conversion graph"
            }
            Error::ConversionNotFound { .. } => {
                "register a conversion edge, or target a kind the source can upcast to"
            }
            Error::UnsupportedExpression(_) => {
                "register a handler for this kind, one of its ancestors, or a registry default"
            }
            _ => return None,
        };
        Some(Box::new(help))
    }
}
