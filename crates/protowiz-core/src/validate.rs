//! Method Contract Validator and service naming rules.

use crate::errors::{ProtowizError, ProtowizResult};
use crate::model::descriptor::MethodContract;
use crate::model::{MethodDecl, Registry, ReturnShape, TypeDescriptor};

/// Strip the required suffix from a service type name.
///
/// `WidgetService` -> `Widget`. A name without the suffix, or one that is
/// nothing but the suffix, is rejected.
pub fn validate_service_name(name: &str, suffix: &str) -> ProtowizResult<String> {
    match name.strip_suffix(suffix) {
        Some(short) if !short.is_empty() => Ok(short.to_string()),
        _ => Err(ProtowizError::InvalidServiceName {
            name: name.to_string(),
            suffix: suffix.to_string(),
        }),
    }
}

/// Check one interface method: one input, one async result, both declared models.
pub fn validate_method(method: &MethodDecl, registry: &Registry) -> ProtowizResult<MethodContract> {
    let input = match method.params.as_slice() {
        [] => return Err(arity(method, "requires one input parameter")),
        [only] => only,
        _ => return Err(arity(method, "has more than one parameter")),
    };

    let output = match &method.returns {
        ReturnShape::Async(ty) => ty,
        ReturnShape::Stream(_) | ReturnShape::Blocking(_) | ReturnShape::Unit => {
            return Err(ProtowizError::MethodReturnShape {
                method: method.name.clone(),
            })
        }
    };

    Ok(MethodContract {
        name: method.name.clone(),
        input: declared_model(method, input, registry)?,
        output: declared_model(method, output, registry)?,
    })
}

fn arity(method: &MethodDecl, problem: &str) -> ProtowizError {
    ProtowizError::MethodArity {
        method: method.name.clone(),
        problem: problem.to_string(),
    }
}

fn declared_model(
    method: &MethodDecl,
    ty: &TypeDescriptor,
    registry: &Registry,
) -> ProtowizResult<String> {
    let context = format!("Service method {}", method.name);
    match ty {
        TypeDescriptor::Named(name) if registry.model(name).is_some() => Ok(name.clone()),
        other => Err(ProtowizError::unknown_model(context, other.to_string())),
    }
}
