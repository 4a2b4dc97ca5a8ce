//! Component E: renders a finalized `Session` as an UPPAAL-flavoured NTA XML
//! document.
//!
//! Clock names are local to a template (two templates both mint `x_0`), so
//! every clock is qualified with its owning template's name before it
//! reaches the document. Channels stay unqualified, since synchronisation
//! is only meaningful when the name is shared across templates.

use crate::error::{BuildError, BuildResult};
use crate::registry::Session;
use crate::template::Template;
use std::collections::BTreeSet;
use xml::writer::{EmitterConfig, XmlEvent};

const DOCTYPE: &str = "<!DOCTYPE nta PUBLIC '-//Uppaal Team//DTD Flat System 1.1//EN' 'http://www.it.uu.se/research/group/darts/uppaal/flat-1_2.dtd'>";

fn qualified_clock(template: &str, clock: &str) -> String {
    format!("{template}_{clock}")
}

fn location_id(template: &str, location: &str) -> String {
    format!("id_{template}_{location}")
}

fn guard_text(template: &Template, transition_id: u32) -> String {
    let mut parts = Vec::new();
    for clock in template.clocks() {
        if let Some(conditions) = clock.guards.get(&transition_id) {
            let q = qualified_clock(&template.name, &clock.name);
            for c in conditions {
                parts.push(format!("{q}{c}"));
            }
        }
    }
    parts.join(" && ")
}

fn assignment_text(template: &Template, transition_id: u32) -> String {
    let mut parts = Vec::new();
    for clock in template.clocks() {
        if clock.resets.contains(&transition_id) {
            parts.push(format!("{} = 0", qualified_clock(&template.name, &clock.name)));
        }
    }
    parts.join(", ")
}

fn invariant_text(template: &Template, location: &str) -> String {
    let mut parts = Vec::new();
    for clock in template.clocks() {
        if let Some(conditions) = clock.invariants.get(location) {
            let q = qualified_clock(&template.name, &clock.name);
            for c in conditions {
                parts.push(format!("{q}{c}"));
            }
        }
    }
    parts.join(" && ")
}

fn global_declaration(session: &Session) -> BuildResult<String> {
    let mut clocks = BTreeSet::new();
    let mut channels = BTreeSet::new();
    for name in session.template_names() {
        let t = session.template(name)?;
        for clock in t.clocks() {
            clocks.insert(qualified_clock(&t.name, &clock.name));
        }
        for channel in t.channels() {
            channels.insert(channel.clone());
        }
    }
    let mut decl = String::new();
    for c in clocks {
        decl.push_str(&format!("clock {c};\n"));
    }
    for c in channels {
        decl.push_str(&format!("chan {c};\n"));
    }
    Ok(decl)
}

fn write_template(
    writer: &mut xml::writer::EventWriter<&mut Vec<u8>>,
    template: &Template,
) -> BuildResult<()> {
    writer.write(XmlEvent::start_element("template")).map_err(xml_err)?;
    writer.write(XmlEvent::start_element("name")).map_err(xml_err)?;
    writer.write(XmlEvent::characters(&template.name)).map_err(xml_err)?;
    writer.write(XmlEvent::end_element()).map_err(xml_err)?;

    for location in template.locations() {
        let id = location_id(&template.name, location);
        writer
            .write(XmlEvent::start_element("location").attr("id", &id))
            .map_err(xml_err)?;
        writer.write(XmlEvent::start_element("name")).map_err(xml_err)?;
        writer.write(XmlEvent::characters(location)).map_err(xml_err)?;
        writer.write(XmlEvent::end_element()).map_err(xml_err)?;

        let inv = invariant_text(template, location);
        if !inv.is_empty() {
            writer
                .write(XmlEvent::start_element("label").attr("kind", "invariant"))
                .map_err(xml_err)?;
            writer.write(XmlEvent::characters(&inv)).map_err(xml_err)?;
            writer.write(XmlEvent::end_element()).map_err(xml_err)?;
        }
        if template.is_committed(location) {
            writer.write(XmlEvent::start_element("committed")).map_err(xml_err)?;
            writer.write(XmlEvent::end_element()).map_err(xml_err)?;
        }
        writer.write(XmlEvent::end_element()).map_err(xml_err)?;
    }

    let init_id = location_id(&template.name, &template.initial);
    writer
        .write(XmlEvent::start_element("init").attr("ref", &init_id))
        .map_err(xml_err)?;
    writer.write(XmlEvent::end_element()).map_err(xml_err)?;

    for transition in template.transitions() {
        writer.write(XmlEvent::start_element("transition")).map_err(xml_err)?;
        let src = location_id(&template.name, &transition.source);
        let dst = location_id(&template.name, &transition.target);
        writer.write(XmlEvent::start_element("source").attr("ref", &src)).map_err(xml_err)?;
        writer.write(XmlEvent::end_element()).map_err(xml_err)?;
        writer.write(XmlEvent::start_element("target").attr("ref", &dst)).map_err(xml_err)?;
        writer.write(XmlEvent::end_element()).map_err(xml_err)?;

        if let Some(recv) = &transition.recv {
            write_label(writer, "synchronisation", &format!("{recv}?"))?;
        }
        if let Some(send) = &transition.send {
            write_label(writer, "synchronisation", &format!("{send}!"))?;
        }
        let guard = guard_text(template, transition.id);
        if !guard.is_empty() {
            write_label(writer, "guard", &guard)?;
        }
        let assignment = assignment_text(template, transition.id);
        if !assignment.is_empty() {
            write_label(writer, "assignment", &assignment)?;
        }
        writer.write(XmlEvent::end_element()).map_err(xml_err)?;
    }

    writer.write(XmlEvent::end_element()).map_err(xml_err)?;
    Ok(())
}

fn write_label(
    writer: &mut xml::writer::EventWriter<&mut Vec<u8>>,
    kind: &str,
    text: &str,
) -> BuildResult<()> {
    writer
        .write(XmlEvent::start_element("label").attr("kind", kind))
        .map_err(xml_err)?;
    writer.write(XmlEvent::characters(text)).map_err(xml_err)?;
    writer.write(XmlEvent::end_element()).map_err(xml_err)?;
    Ok(())
}

fn xml_err(e: xml::writer::Error) -> BuildError {
    BuildError::internal(format!("xml emission failed: {e}"))
}

/// Renders the whole session. Every template must already be finalized.
pub fn emit(session: &Session) -> BuildResult<String> {
    if !session.all_finalized() {
        return Err(BuildError::internal(
            "cannot emit an NTA while a template has not been finalized",
        ));
    }

    let mut body = Vec::new();
    {
        let mut writer = EmitterConfig::new()
            .write_document_declaration(false)
            .perform_indent(true)
            .create_writer(&mut body);

        writer.write(XmlEvent::start_element("nta")).map_err(xml_err)?;
        writer.write(XmlEvent::start_element("declaration")).map_err(xml_err)?;
        writer.write(XmlEvent::characters(&global_declaration(session)?)).map_err(xml_err)?;
        writer.write(XmlEvent::end_element()).map_err(xml_err)?;

        for name in session.template_names() {
            write_template(&mut writer, session.template(name)?)?;
        }

        let system_line = format!("system {};", session.template_names().join(", "));
        writer.write(XmlEvent::start_element("system")).map_err(xml_err)?;
        writer.write(XmlEvent::characters(&system_line)).map_err(xml_err)?;
        writer.write(XmlEvent::end_element()).map_err(xml_err)?;
        writer.write(XmlEvent::end_element()).map_err(xml_err)?;
    }

    let body = String::from_utf8(body)
        .map_err(|e| BuildError::internal(format!("non-utf8 xml output: {e}")))?;
    Ok(format!("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n{DOCTYPE}\n{body}\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatcher::Dispatcher;
    use crate::instruction::Instruction;

    #[test]
    fn emits_locations_and_transitions() {
        let mut session = Session::new();
        let mut dispatcher = Dispatcher::new();
        dispatcher
            .process(
                &mut session,
                Instruction::InitMulti {
                    template: "Traffic".into(),
                    locations: vec!["Red".into(), "Green".into()],
                    initial: "Red".into(),
                },
            )
            .unwrap();
        dispatcher
            .process(
                &mut session,
                Instruction::SimpleTransition {
                    template: "Traffic".into(),
                    from: vec!["Red".into()],
                    to: vec!["Green".into()],
                },
            )
            .unwrap();
        assert!(dispatcher.finalize(&mut session).is_empty());

        let xml = emit(&session).unwrap();
        assert!(xml.contains("<name>Traffic</name>"));
        assert!(xml.contains("<name>Red</name>"));
        assert!(xml.contains("system Traffic;"));
    }
}
