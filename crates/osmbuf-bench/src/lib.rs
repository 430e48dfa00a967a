//! Shared helpers for the osmbuf benchmarks.

use osmbuf_xml::XmlEvent;

/// Generate the markup events of a document with `count` tagged nodes.
pub fn node_document(count: usize) -> Vec<XmlEvent> {
    let mut events = Vec::with_capacity(count * 4 + 2);
    events.push(XmlEvent::start(
        "osm",
        &[("version", "0.6"), ("generator", "bench")],
    ));
    for i in 0..count {
        let id = (i + 1).to_string();
        let lon = format!("{:.7}", (i % 360) as f64 - 180.0);
        let lat = format!("{:.7}", (i % 180) as f64 - 90.0);
        events.push(XmlEvent::start(
            "node",
            &[
                ("id", id.as_str()),
                ("lon", lon.as_str()),
                ("lat", lat.as_str()),
                ("user", "bench"),
            ],
        ));
        events.push(XmlEvent::start("tag", &[("k", "name"), ("v", "somewhere")]));
        events.push(XmlEvent::end("tag"));
        events.push(XmlEvent::end("node"));
    }
    events.push(XmlEvent::end("osm"));
    events
}
