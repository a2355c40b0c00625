//! Example: build a small document, index it and watch it change

use fos_xdom::{
    Document, ElementIndex, NodeDefinitions, ObservedEvents, ObserverScope, TextWriter,
    ValueFactory,
};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), fos_xdom::DomError> {
    // Initialize logging (RUST_LOG=fos_xdom=trace for mutation traces)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut definitions = NodeDefinitions::new();
    definitions.define_attribute("data-count", ValueFactory::integer())?;
    let mut doc = Document::with_definitions(definitions);
    let classes = doc.add_index(ElementIndex::by_tokens("class")?);

    let root = doc.root();
    let html = doc.create_element("html")?;
    doc.append_child(root, html)?;
    let list = doc.create_element("ul")?;
    doc.append_child(html, list)?;

    let observer = doc.observe(
        list,
        ObserverScope::SelfAndDescendants,
        ObservedEvents::Any,
        |doc, event| {
            println!("event on {:?}: {:?}", doc.node_name(event.origin())?, event);
            Ok(())
        },
    )?;

    for (i, label) in ["Home", "Docs", "About"].iter().enumerate() {
        let item = doc.create_element("li")?;
        doc.set_attribute(item, "class", if i == 0 { "item active" } else { "item" })?;
        doc.set_attribute(item, "data-count", &i.to_string())?;
        let text = doc.create_text(label);
        doc.append_child(item, text)?;
        doc.append_child(list, item)?;
    }
    observer.dispose();

    let index = doc.index(classes)?;
    println!("item: {} elements", index.elements("item").len());
    println!("active: {:?}", index.elements("active"));

    let mut text = TextWriter::new();
    doc.write_to(&mut text)?;
    println!("text: {}", text.as_str());
    Ok(())
}
