//! Schema emitter: renders the combined proto3 file.

use crate::config::GeneratorConfig;
use crate::cw_writeln;
use crate::errors::ProtowizResult;
use crate::model::{MessageDescriptor, ServiceGraph, ServiceRecord};
use crate::naming::Naming;

use super::code_writer::CodeWriter;
use super::{EmittedMessages, GENERATED_NOTICE};

/// Accumulates service and message blocks, one service record at a time.
pub struct SchemaEmitter<'a> {
    naming: Naming<'a>,
    w: CodeWriter,
}

impl<'a> SchemaEmitter<'a> {
    /// Start a schema: notice, syntax and package lines.
    pub fn new(cfg: &'a GeneratorConfig) -> ProtowizResult<Self> {
        let mut w = CodeWriter::new();
        cw_writeln!(w, "// {GENERATED_NOTICE}")?;
        w.blank_line()?;
        w.writeln("syntax = \"proto3\";")?;
        w.blank_line()?;
        cw_writeln!(w, "package {};", cfg.namespace)?;
        Ok(Self {
            naming: Naming::new(&cfg.naming),
            w,
        })
    }

    /// Emit the service block for `record`, then a message block for every
    /// referenced model not yet in `emitted`.
    pub fn emit_service(
        &mut self,
        record: &ServiceRecord,
        graph: &ServiceGraph,
        emitted: &mut EmittedMessages,
    ) -> ProtowizResult<()> {
        let naming = self.naming;
        self.w.blank_line()?;
        let header = format!("service {}", naming.wire_service(&record.short_name));
        self.w.block(&header, |w| -> ProtowizResult<()> {
            for m in &record.methods {
                cw_writeln!(
                    w,
                    "rpc {} ({}) returns ({});",
                    naming.rpc_method(&m.name),
                    naming.wire_message(&m.input),
                    naming.wire_message(&m.output)
                )?;
            }
            Ok(())
        })?;

        for name in &record.referenced_models {
            if !emitted.mark(name) {
                continue;
            }
            let message = graph.message(name)?;
            self.emit_message(message)?;
        }
        Ok(())
    }

    fn emit_message(&mut self, message: &MessageDescriptor) -> ProtowizResult<()> {
        self.w.blank_line()?;
        let header = format!("message {}", message.wire_name);
        self.w.block(&header, |w| -> ProtowizResult<()> {
            for f in &message.fields {
                cw_writeln!(w, "{} {} = {};", f.schema_type(), f.wire_name, f.ordinal)?;
            }
            Ok(())
        })
    }

    pub fn finish(self) -> String {
        self.w.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::discover;
    use crate::model::{InterfaceDecl, MethodDecl, ModelDecl, Registry, ServiceDecl, TypeDescriptor};

    fn render(reg: &Registry) -> String {
        let cfg = GeneratorConfig::default().with_namespace("people_demo");
        let graph = discover(reg, &cfg).unwrap();
        let mut emitted = EmittedMessages::new();
        let mut schema = SchemaEmitter::new(&cfg).unwrap();
        for rec in &graph.records {
            schema.emit_service(rec, &graph, &mut emitted).unwrap();
        }
        schema.finish()
    }

    fn shared_models(reg: &mut Registry) {
        reg.register_model(
            ModelDecl::new("Person")
                .marked()
                .field("Id", TypeDescriptor::Int32)
                .field("FirstName", TypeDescriptor::String),
        )
        .register_model(ModelDecl::new("IdRequest").field("Id", TypeDescriptor::Int32))
        .register_model(
            ModelDecl::new("PersonResponse").field("Person", TypeDescriptor::named("Person")),
        );
    }

    #[test]
    fn renders_service_and_messages() {
        let mut reg = Registry::new();
        shared_models(&mut reg);
        reg.register_service(ServiceDecl::new("PeopleService").interface(
            InterfaceDecl::new("PeopleApi").method(MethodDecl::unary(
                "get_by_id",
                "IdRequest",
                "PersonResponse",
            )),
        ));

        let expected = "\
// Generated by protowiz. Do not edit.

syntax = \"proto3\";

package people_demo;

service GrpcPeople {
    rpc GetById (GrpcIdRequest) returns (GrpcPersonResponse);
}

message GrpcIdRequest {
    int32 id = 1;
}

message GrpcPersonResponse {
    GrpcPerson person = 1;
}

message GrpcPerson {
    int32 id = 1;
    string first_name = 2;
}
";
        assert_eq!(render(&reg), expected);
    }

    #[test]
    fn shared_model_is_emitted_once() {
        let mut reg = Registry::new();
        shared_models(&mut reg);
        reg.register_service(ServiceDecl::new("PeopleService").interface(
            InterfaceDecl::new("PeopleApi").method(MethodDecl::unary(
                "get_by_id",
                "IdRequest",
                "PersonResponse",
            )),
        ))
        .register_service(ServiceDecl::new("DirectoryService").with_model("Person").interface(
            InterfaceDecl::new("DirectoryApi").method(MethodDecl::unary(
                "lookup",
                "IdRequest",
                "PersonResponse",
            )),
        ));

        let text = render(&reg);
        assert_eq!(text.matches("message GrpcPerson {").count(), 1);
        assert_eq!(text.matches("message GrpcIdRequest {").count(), 1);
        assert_eq!(text.matches("service ").count(), 2);
        assert!(text.contains("service GrpcDirectory {"));
    }
}
