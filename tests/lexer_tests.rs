use std::collections::HashSet;

use setexpr::{Lexer, Token, TokenKind, TokenStream};
use yare::parameterized;

fn tok(kind: TokenKind, position: usize, text: &str) -> Token {
    Token::new(kind, position, text)
}

fn lex(input: &str) -> Vec<Token> {
    Lexer::new(input).collect()
}

use TokenKind::*;

#[parameterized(
    whitespace_key = { " =", vec![tok(MapKey, 0, " "), tok(Assignment, 1, "="), tok(End, 2, "")] },
    simple_key = { "key=", vec![tok(MapKey, 0, "key"), tok(Assignment, 3, "="), tok(End, 4, "")] },
    key_after_key = { "key1.key2=", vec![
        tok(MapKey, 0, "key1"),
        tok(KeySeparator, 4, "."),
        tok(MapKey, 5, "key2"),
        tok(Assignment, 9, "="),
        tok(End, 10, ""),
    ] },
    key_with_whitespace = { "part1 part2=", vec![tok(MapKey, 0, "part1 part2"), tok(Assignment, 11, "="), tok(End, 12, "")] },
    escaped_key_separator = { "part1\\.part2=", vec![tok(MapKey, 0, "part1.part2"), tok(Assignment, 12, "="), tok(End, 13, "")] },
    escaped_assignment = { "part1\\=part2=", vec![tok(MapKey, 0, "part1=part2"), tok(Assignment, 12, "="), tok(End, 13, "")] },
    escaped_open_bracket = { "part1\\[part2=", vec![tok(MapKey, 0, "part1[part2"), tok(Assignment, 12, "="), tok(End, 13, "")] },
    escaped_close_bracket = { "part1\\]part2=", vec![tok(MapKey, 0, "part1]part2"), tok(Assignment, 12, "="), tok(End, 13, "")] },
    escaped_backslash_in_key = { "a\\\\b=", vec![tok(MapKey, 0, "a\\b"), tok(Assignment, 4, "="), tok(End, 5, "")] },
    key_starting_with_escape = { "\\.a=", vec![tok(MapKey, 0, ".a"), tok(Assignment, 3, "="), tok(End, 4, "")] },
    unicode_key = { "ключ=v", vec![tok(MapKey, 0, "ключ"), tok(Assignment, 8, "="), tok(Scalar, 9, "v"), tok(End, 10, "")] },
    simple_value = { "key=value", vec![
        tok(MapKey, 0, "key"),
        tok(Assignment, 3, "="),
        tok(Scalar, 4, "value"),
        tok(End, 9, ""),
    ] },
    value_with_key_characters = { "key=a.b[0]=c", vec![
        tok(MapKey, 0, "key"),
        tok(Assignment, 3, "="),
        tok(Scalar, 4, "a.b[0]=c"),
        tok(End, 12, ""),
    ] },
    quoted_value = { "key='value'", vec![
        tok(MapKey, 0, "key"),
        tok(Assignment, 3, "="),
        tok(Quoted, 4, "value"),
        tok(End, 11, ""),
    ] },
    quoted_value_with_comma = { "key='val1,val2'", vec![
        tok(MapKey, 0, "key"),
        tok(Assignment, 3, "="),
        tok(Quoted, 4, "val1,val2"),
        tok(End, 15, ""),
    ] },
    quoted_value_with_escaped_quote = { "key='val1\\'val2'", vec![
        tok(MapKey, 0, "key"),
        tok(Assignment, 3, "="),
        tok(Quoted, 4, "val1'val2"),
        tok(End, 16, ""),
    ] },
    empty_quoted_value = { "key=''", vec![
        tok(MapKey, 0, "key"),
        tok(Assignment, 3, "="),
        tok(Quoted, 4, ""),
        tok(End, 6, ""),
    ] },
    escaped_comma_in_value = { "key=part1\\,part2", vec![
        tok(MapKey, 0, "key"),
        tok(Assignment, 3, "="),
        tok(Scalar, 4, "part1,part2"),
        tok(End, 16, ""),
    ] },
    escaped_open_curly_in_value = { "key=part1\\{part2", vec![
        tok(MapKey, 0, "key"),
        tok(Assignment, 3, "="),
        tok(Scalar, 4, "part1{part2"),
        tok(End, 16, ""),
    ] },
    escaped_close_curly_in_value = { "key=part1\\}part2", vec![
        tok(MapKey, 0, "key"),
        tok(Assignment, 3, "="),
        tok(Scalar, 4, "part1}part2"),
        tok(End, 16, ""),
    ] },
    verbatim_with_quotes = { "key=@'val'", vec![
        tok(MapKey, 0, "key"),
        tok(Assignment, 3, "="),
        tok(Verbatim, 4, "'val'"),
        tok(End, 10, ""),
    ] },
    verbatim_with_commas = { "key=@,val,", vec![
        tok(MapKey, 0, "key"),
        tok(Assignment, 3, "="),
        tok(Verbatim, 4, ",val,"),
        tok(End, 10, ""),
    ] },
    verbatim_with_curly_brackets = { "key=@{val}", vec![
        tok(MapKey, 0, "key"),
        tok(Assignment, 3, "="),
        tok(Verbatim, 4, "{val}"),
        tok(End, 10, ""),
    ] },
    verbatim_keeps_backslashes = { "key=@a\\b", vec![
        tok(MapKey, 0, "key"),
        tok(Assignment, 3, "="),
        tok(Verbatim, 4, "a\\b"),
        tok(End, 8, ""),
    ] },
    empty_verbatim = { "k=@", vec![tok(MapKey, 0, "k"), tok(Assignment, 1, "="), tok(Verbatim, 2, ""), tok(End, 3, "")] },
    two_clauses = { "key1=val1,key2=val2", vec![
        tok(MapKey, 0, "key1"),
        tok(Assignment, 4, "="),
        tok(Scalar, 5, "val1"),
        tok(NextKey, 9, ","),
        tok(MapKey, 10, "key2"),
        tok(Assignment, 14, "="),
        tok(Scalar, 15, "val2"),
        tok(End, 19, ""),
    ] },
    empty_value_then_clause = { "a=,b=1", vec![
        tok(MapKey, 0, "a"),
        tok(Assignment, 1, "="),
        tok(NextKey, 2, ","),
        tok(MapKey, 3, "b"),
        tok(Assignment, 4, "="),
        tok(Scalar, 5, "1"),
        tok(End, 6, ""),
    ] },
    empty_array_value = { "key={}", vec![
        tok(MapKey, 0, "key"),
        tok(Assignment, 3, "="),
        tok(ListStart, 4, "{"),
        tok(ListEnd, 5, "}"),
        tok(End, 6, ""),
    ] },
    array_with_two_empty_elements = { "key={,}", vec![
        tok(MapKey, 0, "key"),
        tok(Assignment, 3, "="),
        tok(ListStart, 4, "{"),
        tok(NextValue, 5, ","),
        tok(ListEnd, 6, "}"),
        tok(End, 7, ""),
    ] },
    array_with_one_element = { "key={v1}", vec![
        tok(MapKey, 0, "key"),
        tok(Assignment, 3, "="),
        tok(ListStart, 4, "{"),
        tok(Scalar, 5, "v1"),
        tok(ListEnd, 7, "}"),
        tok(End, 8, ""),
    ] },
    array_with_two_elements = { "key={v1,v2}", vec![
        tok(MapKey, 0, "key"),
        tok(Assignment, 3, "="),
        tok(ListStart, 4, "{"),
        tok(Scalar, 5, "v1"),
        tok(NextValue, 7, ","),
        tok(Scalar, 8, "v2"),
        tok(ListEnd, 10, "}"),
        tok(End, 11, ""),
    ] },
    array_with_quoted_element = { "k={'a,b',c}", vec![
        tok(MapKey, 0, "k"),
        tok(Assignment, 1, "="),
        tok(ListStart, 2, "{"),
        tok(Quoted, 3, "a,b"),
        tok(NextValue, 8, ","),
        tok(Scalar, 9, "c"),
        tok(ListEnd, 10, "}"),
        tok(End, 11, ""),
    ] },
    at_sign_inside_array = { "k={@a}", vec![
        tok(MapKey, 0, "k"),
        tok(Assignment, 1, "="),
        tok(ListStart, 2, "{"),
        tok(Scalar, 3, "@a"),
        tok(ListEnd, 5, "}"),
        tok(End, 6, ""),
    ] },
    array_then_clause = { "k={v},j=w", vec![
        tok(MapKey, 0, "k"),
        tok(Assignment, 1, "="),
        tok(ListStart, 2, "{"),
        tok(Scalar, 3, "v"),
        tok(ListEnd, 4, "}"),
        tok(NextKey, 5, ","),
        tok(MapKey, 6, "j"),
        tok(Assignment, 7, "="),
        tok(Scalar, 8, "w"),
        tok(End, 9, ""),
    ] },
    array_index = { "key[10]=v", vec![
        tok(MapKey, 0, "key"),
        tok(IndexStart, 3, "["),
        tok(Index, 4, "10"),
        tok(IndexEnd, 6, "]"),
        tok(Assignment, 7, "="),
        tok(Scalar, 8, "v"),
        tok(End, 9, ""),
    ] },
    two_array_indexes = { "key[0][1]=v", vec![
        tok(MapKey, 0, "key"),
        tok(IndexStart, 3, "["),
        tok(Index, 4, "0"),
        tok(IndexEnd, 5, "]"),
        tok(IndexStart, 6, "["),
        tok(Index, 7, "1"),
        tok(IndexEnd, 8, "]"),
        tok(Assignment, 9, "="),
        tok(Scalar, 10, "v"),
        tok(End, 11, ""),
    ] },
    key_after_array_index = { "key1[0].key2=v", vec![
        tok(MapKey, 0, "key1"),
        tok(IndexStart, 4, "["),
        tok(Index, 5, "0"),
        tok(IndexEnd, 6, "]"),
        tok(KeySeparator, 7, "."),
        tok(MapKey, 8, "key2"),
        tok(Assignment, 12, "="),
        tok(Scalar, 13, "v"),
        tok(End, 14, ""),
    ] },
)]
fn test_lex_ok(input: &str, expected: Vec<Token>) {
    assert_eq!(lex(input), expected);
}

#[parameterized(
    empty_input = { "", vec![tok(Error, 0, "unexpected end, expecting a map key")] },
    key_without_assignment = { "key", vec![
        tok(MapKey, 0, "key"),
        tok(Error, 3, "unexpected end, expecting '.', '=' or '['"),
    ] },
    unterminated_string = { "key='", vec![
        tok(MapKey, 0, "key"),
        tok(Assignment, 3, "="),
        tok(Error, 4, "unterminated string, expected ''', got end"),
    ] },
    unterminated_string_with_content = { "key='abc", vec![
        tok(MapKey, 0, "key"),
        tok(Assignment, 3, "="),
        tok(Error, 4, "unterminated string, expected ''', got end"),
    ] },
    empty_value_then_missing_key = { "key=,", vec![
        tok(MapKey, 0, "key"),
        tok(Assignment, 3, "="),
        tok(NextKey, 4, ","),
        tok(Error, 5, "unexpected end, expecting a map key"),
    ] },
    value_then_missing_key = { "key=v,", vec![
        tok(MapKey, 0, "key"),
        tok(Assignment, 3, "="),
        tok(Scalar, 4, "v"),
        tok(NextKey, 5, ","),
        tok(Error, 6, "unexpected end, expecting a map key"),
    ] },
    leading_key_separator = { ".", vec![tok(Error, 0, "unexpected character: U+002E '.', expecting a map key")] },
    leading_assignment = { "=", vec![tok(Error, 0, "unexpected character: U+003D '=', expecting a map key")] },
    leading_open_bracket = { "[0]=v", vec![tok(Error, 0, "unexpected character: U+005B '[', expecting a map key")] },
    assignment_after_clause_separator = { "k=v,=", vec![
        tok(MapKey, 0, "k"),
        tok(Assignment, 1, "="),
        tok(Scalar, 2, "v"),
        tok(NextKey, 3, ","),
        tok(Error, 4, "unexpected character: U+003D '=', expecting a map key"),
    ] },
    double_key_separator = { "a..b=v", vec![
        tok(MapKey, 0, "a"),
        tok(KeySeparator, 1, "."),
        tok(Error, 2, "unexpected character: U+002E '.', expecting a map key"),
    ] },
    stray_close_bracket = { "key]=v", vec![
        tok(MapKey, 0, "key"),
        tok(Error, 3, "unexpected character: U+005D ']', expecting '.', '=' or '['"),
    ] },
    unknown_escape_in_key = { "part1\\-part2=", vec![
        tok(Error, 0, "unknown escape sequence: character: U+002D '-'"),
    ] },
    escape_at_end_of_key = { "key\\", vec![tok(Error, 0, "unknown escape sequence: end")] },
    unknown_escape_in_value = { "key=part1\\-part2", vec![
        tok(MapKey, 0, "key"),
        tok(Assignment, 3, "="),
        tok(Error, 4, "unknown escape sequence: character: U+002D '-'"),
    ] },
    unknown_escape_in_string = { "key='val1\\-val2'", vec![
        tok(MapKey, 0, "key"),
        tok(Assignment, 3, "="),
        tok(Error, 4, "unknown escape sequence: character: U+002D '-'"),
    ] },
    missing_array_index = { "k[", vec![
        tok(MapKey, 0, "k"),
        tok(IndexStart, 1, "["),
        tok(Error, 2, "unexpected end, expecting an array index"),
    ] },
    open_bracket_as_index = { "k[[", vec![
        tok(MapKey, 0, "k"),
        tok(IndexStart, 1, "["),
        tok(Error, 2, "unexpected character: U+005B '[', expecting an array index"),
    ] },
    negative_index = { "k[-1]=v", vec![
        tok(MapKey, 0, "k"),
        tok(IndexStart, 1, "["),
        tok(Error, 2, "unexpected character: U+002D '-', expecting an array index"),
    ] },
    control_character_as_index = { "k[\n", vec![
        tok(MapKey, 0, "k"),
        tok(IndexStart, 1, "["),
        tok(Error, 2, "unexpected character: U+000A, expecting an array index"),
    ] },
    no_break_space_as_index = { "k[\u{a0}", vec![
        tok(MapKey, 0, "k"),
        tok(IndexStart, 1, "["),
        tok(Error, 2, "unexpected character: U+00A0, expecting an array index"),
    ] },
    zero_width_space_as_index = { "k[\u{200b}", vec![
        tok(MapKey, 0, "k"),
        tok(IndexStart, 1, "["),
        tok(Error, 2, "unexpected character: U+200B, expecting an array index"),
    ] },
    line_separator_as_index = { "k[\u{2028}", vec![
        tok(MapKey, 0, "k"),
        tok(IndexStart, 1, "["),
        tok(Error, 2, "unexpected character: U+2028, expecting an array index"),
    ] },
    letter_as_index = { "k[\u{e9}", vec![
        tok(MapKey, 0, "k"),
        tok(IndexStart, 1, "["),
        tok(Error, 2, "unexpected character: U+00E9 '\u{e9}', expecting an array index"),
    ] },
    incomplete_index = { "key[0", vec![
        tok(MapKey, 0, "key"),
        tok(IndexStart, 3, "["),
        tok(Index, 4, "0"),
        tok(Error, 5, "unexpected end, expecting ']'"),
    ] },
    non_digit_in_index = { "key[1a]", vec![
        tok(MapKey, 0, "key"),
        tok(IndexStart, 3, "["),
        tok(Index, 4, "1"),
        tok(Error, 5, "unexpected character: U+0061 'a', expecting ']'"),
    ] },
    array_index_without_value = { "key[0]", vec![
        tok(MapKey, 0, "key"),
        tok(IndexStart, 3, "["),
        tok(Index, 4, "0"),
        tok(IndexEnd, 5, "]"),
        tok(Error, 6, "unexpected end, expecting '.', '=' or '['"),
    ] },
    key_after_array_index = { "k1[0]k2", vec![
        tok(MapKey, 0, "k1"),
        tok(IndexStart, 2, "["),
        tok(Index, 3, "0"),
        tok(IndexEnd, 4, "]"),
        tok(Error, 5, "unexpected character: U+006B 'k', expecting '.', '=' or '['"),
    ] },
    nested_open_curly = { "k={{", vec![
        tok(MapKey, 0, "k"),
        tok(Assignment, 1, "="),
        tok(ListStart, 2, "{"),
        tok(Error, 3, "unexpected character: U+007B '{', expecting '}', ',' or a value"),
    ] },
    unterminated_array = { "k={", vec![
        tok(MapKey, 0, "k"),
        tok(Assignment, 1, "="),
        tok(ListStart, 2, "{"),
        tok(Error, 3, "unexpected end, expecting '}', ',' or a value"),
    ] },
    unterminated_array_after_value = { "k={v", vec![
        tok(MapKey, 0, "k"),
        tok(Assignment, 1, "="),
        tok(ListStart, 2, "{"),
        tok(Scalar, 3, "v"),
        tok(Error, 4, "unexpected end, expecting ',' or '}'"),
    ] },
    close_curly_after_array = { "k={v}}", vec![
        tok(MapKey, 0, "k"),
        tok(Assignment, 1, "="),
        tok(ListStart, 2, "{"),
        tok(Scalar, 3, "v"),
        tok(ListEnd, 4, "}"),
        tok(Error, 5, "unexpected character: U+007D '}', expecting ',' or the end"),
    ] },
    close_curly_as_value = { "k=}", vec![
        tok(MapKey, 0, "k"),
        tok(Assignment, 1, "="),
        tok(Error, 2, "unexpected character: U+007D '}', expecting '{', ',', a value or the end"),
    ] },
    open_curly_after_array_value = { "k={v{", vec![
        tok(MapKey, 0, "k"),
        tok(Assignment, 1, "="),
        tok(ListStart, 2, "{"),
        tok(Scalar, 3, "v"),
        tok(Error, 4, "unexpected character: U+007B '{', expecting ',' or '}'"),
    ] },
    quote_inside_value = { "k=it's", vec![
        tok(MapKey, 0, "k"),
        tok(Assignment, 1, "="),
        tok(Scalar, 2, "it"),
        tok(Error, 4, "unexpected character: U+0027 ''', expecting ',' or the end"),
    ] },
    text_after_string = { "k='a'b", vec![
        tok(MapKey, 0, "k"),
        tok(Assignment, 1, "="),
        tok(Quoted, 2, "a"),
        tok(Error, 5, "unexpected character: U+0062 'b', expecting ',' or the end"),
    ] },
)]
fn test_lex_err(input: &str, expected: Vec<Token>) {
    assert_eq!(lex(input), expected);
}

#[test]
fn test_cancel_stops_the_stream() {
    let mut lexer = Lexer::new("foo=bar");
    assert_eq!(lexer.next(), Some(tok(MapKey, 0, "foo")));

    lexer.cancel();

    assert!(lexer.is_finished());
    assert_eq!(lexer.next(), None);
    assert_eq!(lexer.next_token().map(|token| token.kind), Ok(End));
}

#[test]
fn test_stream_is_exhausted_after_error() {
    let mut lexer = Lexer::new("k[x");
    let kinds: Vec<_> = lexer.by_ref().map(|token| token.kind).collect();

    assert_eq!(kinds, vec![MapKey, IndexStart, Error]);
    assert!(lexer.is_finished());
    assert_eq!(lexer.next_token().map(|token| token.kind), Ok(End));
}

#[test]
fn test_every_token_kind_has_a_distinct_name() {
    let names: HashSet<_> = TokenKind::ALL.iter().map(|kind| kind.to_string()).collect();

    assert_eq!(names.len(), TokenKind::ALL.len());
    assert!(names.iter().all(|name| !name.is_empty()));
}
