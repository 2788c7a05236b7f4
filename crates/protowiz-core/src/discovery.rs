//! Discovery and graph builder.
//!
//! Turns a [`Registry`] into a [`ServiceGraph`]. Every service is validated
//! here, before any emitter runs, so a failing method in the last service
//! still aborts the run with nothing rendered.

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use crate::config::GeneratorConfig;
use crate::errors::{ProtowizError, ProtowizResult};
use crate::mapper::build_message;
use crate::model::descriptor::MethodContract;
use crate::model::{InterfaceDecl, MessageCatalog, Registry, ServiceDecl, ServiceGraph, ServiceRecord};
use crate::naming::{is_identifier, Naming};
use crate::validate::{validate_method, validate_service_name};

/// Build the service graph for a registry.
pub fn discover(registry: &Registry, cfg: &GeneratorConfig) -> ProtowizResult<ServiceGraph> {
    if registry.is_empty() {
        return Err(ProtowizError::empty_input("type registry has no types"));
    }

    let naming = Naming::new(&cfg.naming);
    check_models(registry, &naming)?;

    let services: Vec<&ServiceDecl> = registry.marked_services().collect();
    if services.is_empty() {
        return Err(ProtowizError::empty_input(
            "no types carry the service marker",
        ));
    }

    let mut short_names: BTreeMap<String, &str> = BTreeMap::new();
    let mut records = Vec::with_capacity(services.len());

    for service in services {
        let short_name = validate_service_name(&service.name, &cfg.naming.service_suffix)?;
        if let Some(first) = short_names.insert(short_name.clone(), &service.name) {
            return Err(ProtowizError::ServiceNameCollision {
                short_name,
                first: first.to_string(),
                second: service.name.clone(),
            });
        }

        let interface = resolve_interface(service)?;
        let methods = validate_methods(interface, registry, &naming)?;
        let referenced_models = referenced_models(service, &methods, registry)?;

        debug!(
            service = %service.name,
            methods = methods.len(),
            models = referenced_models.len(),
            "discovered service"
        );

        records.push(ServiceRecord {
            service_name: service.name.clone(),
            short_name,
            interface_name: interface.name.clone(),
            methods,
            referenced_models,
        });
    }

    let mut messages = MessageCatalog::new();
    for name in records.iter().flat_map(|r| r.referenced_models.iter()) {
        if messages.contains(name) {
            continue;
        }
        let model = registry
            .model(name)
            .ok_or_else(|| ProtowizError::invariant(format!("model {name} vanished")))?;
        messages.insert(build_message(model, &naming)?);
    }

    check_service_symbols(&records, &messages, &naming)?;

    Ok(ServiceGraph { records, messages })
}

/// Declared names must be unique, and so must every identifier derived from
/// them: the wire message and the converter module.
fn check_models(registry: &Registry, naming: &Naming<'_>) -> ProtowizResult<()> {
    let mut seen = BTreeSet::new();
    let mut derived: BTreeMap<String, &str> = BTreeMap::new();
    for model in &registry.models {
        if !is_identifier(&model.name) {
            return Err(ProtowizError::invalid_argument(format!(
                "model name must be an identifier: {:?}",
                model.name
            )));
        }
        if !seen.insert(model.name.as_str()) {
            return Err(ProtowizError::DuplicateModel {
                name: model.name.clone(),
            });
        }
        for ident in [
            naming.wire_message(&model.name),
            naming.converter_module(&model.name),
        ] {
            if let Some(first) = derived.get(&ident) {
                return Err(ProtowizError::name_collision(ident, *first, &model.name));
            }
            derived.insert(ident, &model.name);
        }
    }
    Ok(())
}

/// Services and messages share one proto package, so a wire service name
/// must not equal any emitted message name. Short names are already
/// distinct, but two of them can still camel-case to the same service.
fn check_service_symbols(
    records: &[ServiceRecord],
    messages: &MessageCatalog,
    naming: &Naming<'_>,
) -> ProtowizResult<()> {
    let mut services: BTreeMap<String, &str> = BTreeMap::new();
    for record in records {
        let wire = naming.wire_service(&record.short_name);
        if let Some(message) = messages.iter().find(|m| m.wire_name == wire) {
            return Err(ProtowizError::name_collision(
                wire,
                &record.service_name,
                format!("model {}", message.name),
            ));
        }
        if let Some(first) = services.get(&wire) {
            return Err(ProtowizError::name_collision(wire, *first, &record.service_name));
        }
        services.insert(wire, &record.service_name);
    }
    Ok(())
}

/// The first interface carrying the service marker.
fn resolve_interface(service: &ServiceDecl) -> ProtowizResult<&InterfaceDecl> {
    service
        .interfaces
        .iter()
        .find(|i| i.marked)
        .ok_or_else(|| ProtowizError::MissingInterface {
            service: service.name.clone(),
        })
}

fn validate_methods(
    interface: &InterfaceDecl,
    registry: &Registry,
    naming: &Naming<'_>,
) -> ProtowizResult<Vec<MethodContract>> {
    let mut rpc_names = BTreeSet::new();
    let mut out = Vec::with_capacity(interface.methods.len());
    for method in &interface.methods {
        let contract = validate_method(method, registry)?;
        if !rpc_names.insert(naming.rpc_method(&contract.name)) {
            return Err(ProtowizError::invalid_argument(format!(
                "interface {} declares method {} twice",
                interface.name, contract.name
            )));
        }
        out.push(contract);
    }
    Ok(out)
}

/// Explicit marker models, then each method's input and output, then
/// everything reachable through nested fields, breadth first.
fn referenced_models(
    service: &ServiceDecl,
    methods: &[MethodContract],
    registry: &Registry,
) -> ProtowizResult<Vec<String>> {
    let mut ordered: Vec<String> = Vec::new();
    let mut seen: BTreeSet<String> = BTreeSet::new();

    let mut push = |name: &str, ordered: &mut Vec<String>| {
        if seen.insert(name.to_string()) {
            ordered.push(name.to_string());
        }
    };

    for name in &service.models {
        if registry.model(name).is_none() {
            return Err(ProtowizError::unknown_model(
                format!("Service {}", service.name),
                name.clone(),
            ));
        }
        push(name, &mut ordered);
    }

    for m in methods {
        push(&m.input, &mut ordered);
        push(&m.output, &mut ordered);
    }

    let mut cursor = 0;
    while cursor < ordered.len() {
        let name = ordered[cursor].clone();
        cursor += 1;

        let model = registry
            .model(&name)
            .ok_or_else(|| ProtowizError::invariant(format!("model {name} vanished")))?;

        for field in &model.fields {
            if let Some(nested) = field.ty.referenced_model() {
                if registry.model(nested).is_none() {
                    return Err(ProtowizError::unknown_model(
                        format!("Field {}.{}", model.name, field.name),
                        nested,
                    ));
                }
                push(nested, &mut ordered);
            }
        }
    }

    Ok(ordered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{InterfaceDecl, MethodDecl, ModelDecl, TypeDescriptor};
    use crate::errors::ErrorKind;
    use assert_matches::assert_matches;

    fn people_registry() -> Registry {
        let mut reg = Registry::new();
        reg.register_model(
            ModelDecl::new("Person")
                .marked()
                .field("Id", TypeDescriptor::Int32)
                .field("Address", TypeDescriptor::named("Address")),
        )
        .register_model(ModelDecl::new("Address").field("City", TypeDescriptor::String))
        .register_model(ModelDecl::new("EmptyRequest"))
        .register_model(ModelDecl::new("IdRequest").field("Id", TypeDescriptor::Int32))
        .register_model(
            ModelDecl::new("PeopleResponse")
                .field("People", TypeDescriptor::list(TypeDescriptor::named("Person"))),
        )
        .register_model(
            ModelDecl::new("PersonResponse").field("Person", TypeDescriptor::named("Person")),
        )
        .register_service(
            ServiceDecl::new("PeopleService").with_model("Person").interface(
                InterfaceDecl::new("PeopleApi")
                    .method(MethodDecl::unary("get_all", "EmptyRequest", "PeopleResponse"))
                    .method(MethodDecl::unary("get_by_id", "IdRequest", "PersonResponse")),
            ),
        );
        reg
    }

    fn run(reg: &Registry) -> ProtowizResult<ServiceGraph> {
        discover(reg, &GeneratorConfig::default())
    }

    #[test]
    fn people_graph() {
        let graph = run(&people_registry()).unwrap();
        assert_eq!(graph.records.len(), 1);

        let rec = &graph.records[0];
        assert_eq!(rec.short_name, "People");
        assert_eq!(rec.interface_name, "PeopleApi");
        assert_eq!(
            rec.referenced_models,
            vec![
                "Person",
                "EmptyRequest",
                "PeopleResponse",
                "IdRequest",
                "PersonResponse",
                "Address"
            ]
        );

        let names: Vec<_> = graph.messages.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, rec.referenced_models);
    }

    #[test]
    fn empty_registry_is_empty_input() {
        let err = run(&Registry::new()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::EmptyInput);
    }

    #[test]
    fn no_marked_services_is_empty_input() {
        let mut reg = Registry::new();
        reg.register_model(ModelDecl::new("Person").marked())
            .register_service(ServiceDecl::new("PeopleService").unmarked());
        let err = run(&reg).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::EmptyInput);
    }

    #[test]
    fn missing_interface() {
        let mut reg = people_registry();
        reg.services[0].interfaces[0].marked = false;
        let err = run(&reg).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Can not find an interface with the service marker on PeopleService"
        );
    }

    #[test]
    fn short_name_collision_is_rejected() {
        let mut reg = people_registry();
        let dup = reg.services[0].clone();
        reg.register_service(dup);
        assert_matches!(
            run(&reg),
            Err(ProtowizError::ServiceNameCollision { ref short_name, .. }) if short_name == "People"
        );
    }

    #[test]
    fn duplicate_model_is_rejected() {
        let mut reg = people_registry();
        reg.register_model(ModelDecl::new("Address"));
        assert_matches!(run(&reg), Err(ProtowizError::DuplicateModel { .. }));
    }

    #[test]
    fn models_with_the_same_wire_name_are_rejected() {
        let mut reg = Registry::new();
        reg.register_model(ModelDecl::new("PersonInfo").field("Id", TypeDescriptor::Int32))
            .register_model(ModelDecl::new("Person_Info").field("Name", TypeDescriptor::String))
            .register_service(
                ServiceDecl::new("PeopleService").interface(
                    InterfaceDecl::new("PeopleApi")
                        .method(MethodDecl::unary("get", "PersonInfo", "Person_Info")),
                ),
            );
        let err = run(&reg).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Structural);
        assert_eq!(
            err.to_string(),
            "PersonInfo and Person_Info both generate the identifier GrpcPersonInfo"
        );
    }

    #[test]
    fn service_and_message_with_the_same_wire_name_are_rejected() {
        let mut reg = Registry::new();
        reg.register_model(ModelDecl::new("IdRequest").field("Id", TypeDescriptor::Int32))
            .register_model(ModelDecl::new("Widget").field("Name", TypeDescriptor::String))
            .register_service(
                ServiceDecl::new("WidgetService").interface(
                    InterfaceDecl::new("WidgetApi")
                        .method(MethodDecl::unary("get", "IdRequest", "Widget")),
                ),
            );
        assert_matches!(
            run(&reg),
            Err(ProtowizError::GeneratedNameCollision { ref ident, ref first, ref second })
                if ident == "GrpcWidget" && first == "WidgetService" && second == "model Widget"
        );
    }

    #[test]
    fn unknown_nested_model_is_rejected() {
        let mut reg = people_registry();
        reg.models[1].fields.push(crate::model::FieldDecl {
            name: "Country".to_string(),
            ty: TypeDescriptor::named("Country"),
            nullable: false,
        });
        let err = run(&reg).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Field Address.Country uses Country which is not a declared model"
        );
    }

    #[test]
    fn bad_method_in_later_service_fails_whole_run() {
        let mut reg = people_registry();
        let mut bad = MethodDecl::unary("lookup", "IdRequest", "PersonResponse");
        bad.params.push(TypeDescriptor::named("IdRequest"));
        reg.register_service(
            ServiceDecl::new("LookupService").interface(InterfaceDecl::new("LookupApi").method(bad)),
        );
        let err = run(&reg).unwrap_err();
        assert!(err.to_string().contains("more than one parameter"));
    }

    #[test]
    fn unsupported_field_fails_discovery() {
        let mut reg = people_registry();
        reg.models[1].fields.push(crate::model::FieldDecl {
            name: "Tags".to_string(),
            ty: TypeDescriptor::map(TypeDescriptor::String, TypeDescriptor::String),
            nullable: false,
        });
        assert_matches!(run(&reg), Err(ProtowizError::UnsupportedType { .. }));
    }
}
