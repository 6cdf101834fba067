// Benchmark helpers - Rust's dead code analysis doesn't understand that these
// are used by benchmark files in the same directory
use ruleweave_engine::{
    CharacterClass, Grammar, GrammarBuilder, GrammarError, choice, class, literal, sequence,
};

#[allow(dead_code)]
pub fn generate_csv(rows: usize) -> String {
    let mut content = String::from("id,name,score\n");
    for row in 0..rows {
        content.push_str(&format!("{row},\"name {row}\",{}\n", row * 7 % 100));
    }
    content
}

#[allow(dead_code)]
pub fn generate_nested_lists(depth: usize, width: usize) -> String {
    if depth == 0 {
        return "x".to_string();
    }
    let inner = generate_nested_lists(depth - 1, width);
    format!("({})", vec![inner; width].join(" "))
}

#[allow(dead_code)]
pub fn csv_grammar() -> Grammar {
    let quote = literal("\"");
    let quoted = sequence([
        quote.clone(),
        sequence([quote.negated()]).zero_or_more(),
        quote,
    ]);
    let bare = sequence([class(CharacterClass::set("\",\r\n")).negated()]).one_or_more();
    let field = choice([quoted, bare]).parse_as("field");
    let row = sequence([
        field.clone(),
        sequence([literal(","), field]).zero_or_more(),
        class(CharacterClass::Newlines).one_or_more(),
    ])
    .parse_as("row");
    Grammar::new([row])
}

#[allow(dead_code)]
pub fn list_grammar() -> Result<Grammar, GrammarError> {
    let mut b = GrammarBuilder::new();
    let item = b.define("item", |b| {
        let nested = b.declare("item");
        let list = sequence([
            literal("("),
            sequence([literal(" ").skip().zero_or_more(), nested]).zero_or_more(),
            literal(")"),
        ])
        .parse_as("list");
        Ok(choice([literal("x").parse_as("atom"), list]))
    })?;
    b.finish([item])
}
