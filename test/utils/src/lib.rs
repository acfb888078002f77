/// History listing as the farm assistant server returns it. The second row
/// carries only the fields older servers send.
pub fn history_list_fixture() -> &'static str {
    return r#"
[
    {"id": "s1", "title": "Paddy pests", "date": "2024-03-01T10:00:00", "preview": "Use neem oil"},
    {"id": "s2", "date": null, "preview": "Empty chat"}
]
"#
    .trim();
}

/// Stored transcript for session `s1`.
pub fn transcript_fixture() -> &'static str {
    return r#"
{
    "id": "s1",
    "userId": "farmer_1",
    "messages": [
        {"content": "Hi", "role": "user", "timestamp": "2024-03-01T10:00:00.123000"},
        {"content": "Hello farmer", "role": "assistant"}
    ]
}
"#
    .trim();
}
