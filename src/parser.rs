use crate::error::{ErrorKind, ParseError};
use crate::map::Map;
use crate::scanner::{Scanner, Token};
use crate::schema::{Schema, ValidationStream, Verdict};
use crate::value::Value;
use std::rc::Rc;

/// Parser configuration.
#[derive(Debug, Clone, Default)]
pub struct ParserOptions {
    /// Maximum container nesting depth; `0` means unlimited.
    pub max_depth: u32,
}

/// Events emitted by the parser while a document is consumed.
///
/// Each parse runs with one statically selected bundle: decode only,
/// validate only, or decode and validate. Container create hooks may
/// decline materialisation by returning `None`; append/update then drop
/// the finished element values after the validation stream has seen them.
pub(crate) trait ParseHooks {
    fn array_create(&mut self) -> Result<Option<Vec<Value>>, ErrorKind>;
    fn array_start(&mut self) -> Result<(), ErrorKind>;
    fn array_append(
        &mut self,
        array: &mut Option<Vec<Value>>,
        value: Value,
    ) -> Result<(), ErrorKind>;
    fn array_end(&mut self) -> Result<(), ErrorKind>;
    fn object_create(&mut self) -> Result<Option<Map>, ErrorKind>;
    fn object_start(&mut self) -> Result<(), ErrorKind>;
    fn object_key(&mut self, key: &Rc<str>) -> Result<(), ErrorKind>;
    fn object_update(
        &mut self,
        object: &mut Option<Map>,
        key: Rc<str>,
        value: Value,
    ) -> Result<(), ErrorKind>;
    fn object_end(&mut self) -> Result<(), ErrorKind>;
    fn value(&mut self, value: &Value) -> Result<(), ErrorKind>;
}

/// Materialise only; the validation hooks are no-ops.
pub(crate) struct DecodeHooks;

impl ParseHooks for DecodeHooks {
    fn array_create(&mut self) -> Result<Option<Vec<Value>>, ErrorKind> {
        Ok(Some(Vec::new()))
    }
    fn array_start(&mut self) -> Result<(), ErrorKind> {
        Ok(())
    }
    fn array_append(
        &mut self,
        array: &mut Option<Vec<Value>>,
        value: Value,
    ) -> Result<(), ErrorKind> {
        if let Some(items) = array {
            items.push(value);
        }
        Ok(())
    }
    fn array_end(&mut self) -> Result<(), ErrorKind> {
        Ok(())
    }
    fn object_create(&mut self) -> Result<Option<Map>, ErrorKind> {
        Ok(Some(Map::new()))
    }
    fn object_start(&mut self) -> Result<(), ErrorKind> {
        Ok(())
    }
    fn object_key(&mut self, _key: &Rc<str>) -> Result<(), ErrorKind> {
        Ok(())
    }
    fn object_update(
        &mut self,
        object: &mut Option<Map>,
        key: Rc<str>,
        value: Value,
    ) -> Result<(), ErrorKind> {
        if let Some(map) = object {
            map.insert(key, value);
        }
        Ok(())
    }
    fn object_end(&mut self) -> Result<(), ErrorKind> {
        Ok(())
    }
    fn value(&mut self, _value: &Value) -> Result<(), ErrorKind> {
        Ok(())
    }
}

/// Drive a validation stream without retaining the document root.
///
/// Element subtrees are still built transiently: `array_append`,
/// `object_update` and `value` deliver completed values, and whole-value
/// keywords (`enum`, `uniqueItems`) need them.
pub(crate) struct ValidateHooks<'s> {
    pub(crate) stream: ValidationStream<'s>,
}

impl<'s> ParseHooks for ValidateHooks<'s> {
    fn array_create(&mut self) -> Result<Option<Vec<Value>>, ErrorKind> {
        Ok(Some(Vec::new()))
    }
    fn array_start(&mut self) -> Result<(), ErrorKind> {
        self.stream.array_start();
        Ok(())
    }
    fn array_append(
        &mut self,
        array: &mut Option<Vec<Value>>,
        value: Value,
    ) -> Result<(), ErrorKind> {
        self.stream.array_append(&value);
        if let Some(items) = array {
            items.push(value);
        }
        Ok(())
    }
    fn array_end(&mut self) -> Result<(), ErrorKind> {
        self.stream.array_end();
        Ok(())
    }
    fn object_create(&mut self) -> Result<Option<Map>, ErrorKind> {
        Ok(Some(Map::new()))
    }
    fn object_start(&mut self) -> Result<(), ErrorKind> {
        self.stream.object_start();
        Ok(())
    }
    fn object_key(&mut self, key: &Rc<str>) -> Result<(), ErrorKind> {
        self.stream.object_key(key);
        Ok(())
    }
    fn object_update(
        &mut self,
        object: &mut Option<Map>,
        key: Rc<str>,
        value: Value,
    ) -> Result<(), ErrorKind> {
        self.stream.object_update(&key, &value);
        if let Some(map) = object {
            map.insert(key, value);
        }
        Ok(())
    }
    fn object_end(&mut self) -> Result<(), ErrorKind> {
        self.stream.object_end();
        Ok(())
    }
    fn value(&mut self, value: &Value) -> Result<(), ErrorKind> {
        self.stream.value(value);
        Ok(())
    }
}

/// Materialise and validate in one pass.
pub(crate) struct DecodeValidateHooks<'s> {
    pub(crate) stream: ValidationStream<'s>,
}

impl<'s> ParseHooks for DecodeValidateHooks<'s> {
    fn array_create(&mut self) -> Result<Option<Vec<Value>>, ErrorKind> {
        Ok(Some(Vec::new()))
    }
    fn array_start(&mut self) -> Result<(), ErrorKind> {
        self.stream.array_start();
        Ok(())
    }
    fn array_append(
        &mut self,
        array: &mut Option<Vec<Value>>,
        value: Value,
    ) -> Result<(), ErrorKind> {
        self.stream.array_append(&value);
        if let Some(items) = array {
            items.push(value);
        }
        Ok(())
    }
    fn array_end(&mut self) -> Result<(), ErrorKind> {
        self.stream.array_end();
        Ok(())
    }
    fn object_create(&mut self) -> Result<Option<Map>, ErrorKind> {
        Ok(Some(Map::new()))
    }
    fn object_start(&mut self) -> Result<(), ErrorKind> {
        self.stream.object_start();
        Ok(())
    }
    fn object_key(&mut self, key: &Rc<str>) -> Result<(), ErrorKind> {
        self.stream.object_key(key);
        Ok(())
    }
    fn object_update(
        &mut self,
        object: &mut Option<Map>,
        key: Rc<str>,
        value: Value,
    ) -> Result<(), ErrorKind> {
        self.stream.object_update(&key, &value);
        if let Some(map) = object {
            map.insert(key, value);
        }
        Ok(())
    }
    fn object_end(&mut self) -> Result<(), ErrorKind> {
        self.stream.object_end();
        Ok(())
    }
    fn value(&mut self, value: &Value) -> Result<(), ErrorKind> {
        self.stream.value(value);
        Ok(())
    }
}

/// Recursive-descent parser over scanner tokens.
pub(crate) struct Parser<'b, H: ParseHooks> {
    scanner: Scanner<'b>,
    hooks: H,
    depth: u32,
    max_depth: u32,
}

impl<'b, H: ParseHooks> Parser<'b, H> {
    pub(crate) fn new(input: &'b [u8], hooks: H, options: &ParserOptions) -> Parser<'b, H> {
        Parser {
            scanner: Scanner::new(input),
            hooks,
            depth: 0,
            max_depth: options.max_depth,
        }
    }

    pub(crate) fn into_hooks(self) -> H {
        self.hooks
    }

    pub(crate) fn parse_document(&mut self) -> Result<Value, ParseError> {
        let token = self.scanner.next_token()?;
        let value = self.parse_value(token)?;
        match self.scanner.next_token()? {
            Token::EndOfInput => Ok(value),
            _ => Err(self.error(ErrorKind::Token)),
        }
    }

    fn error(&self, kind: ErrorKind) -> ParseError {
        ParseError::new(kind, self.scanner.location())
    }

    fn hook<T>(&self, result: Result<T, ErrorKind>) -> Result<T, ParseError> {
        result.map_err(|kind| self.error(kind))
    }

    fn parse_value(&mut self, token: Token) -> Result<Value, ParseError> {
        match token {
            Token::Null => self.scalar(Value::Null),
            Token::True => self.scalar(Value::Bool(true)),
            Token::False => self.scalar(Value::Bool(false)),
            Token::Int(int) => self.scalar(Value::Int(int)),
            Token::Double(double) => self.scalar(Value::Double(double)),
            Token::Str(text) => self.scalar(Value::String(text)),
            Token::ArrayStart => self.parse_array(),
            Token::ObjectStart => self.parse_object(),
            _ => Err(self.error(ErrorKind::Token)),
        }
    }

    fn scalar(&mut self, value: Value) -> Result<Value, ParseError> {
        let result = self.hooks.value(&value);
        self.hook(result)?;
        Ok(value)
    }

    fn enter(&mut self) -> Result<(), ParseError> {
        if self.max_depth > 0 && self.depth == self.max_depth {
            return Err(self.error(ErrorKind::Depth));
        }
        self.depth += 1;
        Ok(())
    }

    fn parse_array(&mut self) -> Result<Value, ParseError> {
        self.enter()?;
        let created = self.hooks.array_create();
        let mut array = self.hook(created)?;
        let started = self.hooks.array_start();
        self.hook(started)?;
        let mut token = self.scanner.next_token()?;
        if token != Token::ArrayEnd {
            loop {
                let element = self.parse_value(token)?;
                let appended = self.hooks.array_append(&mut array, element);
                self.hook(appended)?;
                match self.scanner.next_token()? {
                    Token::Comma => token = self.scanner.next_token()?,
                    Token::ArrayEnd => break,
                    _ => return Err(self.error(ErrorKind::Token)),
                }
            }
        }
        let ended = self.hooks.array_end();
        self.hook(ended)?;
        self.depth -= 1;
        Ok(Value::Array(Rc::new(array.unwrap_or_default())))
    }

    fn parse_object(&mut self) -> Result<Value, ParseError> {
        self.enter()?;
        let created = self.hooks.object_create();
        let mut object = self.hook(created)?;
        let started = self.hooks.object_start();
        self.hook(started)?;
        let mut token = self.scanner.next_token()?;
        if token != Token::ObjectEnd {
            loop {
                let key = match token {
                    Token::Str(key) => key,
                    _ => return Err(self.error(ErrorKind::Token)),
                };
                let keyed = self.hooks.object_key(&key);
                self.hook(keyed)?;
                if self.scanner.next_token()? != Token::Colon {
                    return Err(self.error(ErrorKind::Token));
                }
                let next = self.scanner.next_token()?;
                let member = self.parse_value(next)?;
                let updated = self.hooks.object_update(&mut object, key, member);
                self.hook(updated)?;
                match self.scanner.next_token()? {
                    Token::Comma => token = self.scanner.next_token()?,
                    Token::ObjectEnd => break,
                    _ => return Err(self.error(ErrorKind::Token)),
                }
            }
        }
        let ended = self.hooks.object_end();
        self.hook(ended)?;
        self.depth -= 1;
        Ok(Value::Object(Rc::new(object.unwrap_or_default())))
    }
}

/// Parse a document into a value tree.
pub fn parse(input: &[u8]) -> Result<Value, ParseError> {
    parse_with_options(input, &ParserOptions::default())
}

/// Parse a document into a value tree with explicit options.
pub fn parse_with_options(input: &[u8], options: &ParserOptions) -> Result<Value, ParseError> {
    let mut parser = Parser::new(input, DecodeHooks, options);
    parser.parse_document()
}

/// Validate a document against a compiled schema while parsing it,
/// without keeping the document root.
pub fn validate_stream(
    input: &[u8],
    schema: &Schema,
    options: &ParserOptions,
) -> Result<Verdict, ParseError> {
    let hooks = ValidateHooks {
        stream: ValidationStream::new(schema),
    };
    let mut parser = Parser::new(input, hooks, options);
    parser.parse_document()?;
    Ok(parser.into_hooks().stream.finish())
}

/// Parse a document and validate it against a compiled schema in one
/// pass, returning both the value tree and the verdict.
pub fn parse_and_validate(
    input: &[u8],
    schema: &Schema,
    options: &ParserOptions,
) -> Result<(Value, Verdict), ParseError> {
    let hooks = DecodeValidateHooks {
        stream: ValidationStream::new(schema),
    };
    let mut parser = Parser::new(input, hooks, options);
    let value = parser.parse_document()?;
    Ok((value, parser.into_hooks().stream.finish()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_str(input: &str) -> Result<Value, ParseError> {
        parse(input.as_bytes())
    }

    #[test]
    fn scalars_parse() {
        assert_eq!(parse_str("null").unwrap(), Value::Null);
        assert_eq!(parse_str("true").unwrap(), Value::Bool(true));
        assert_eq!(parse_str("-12").unwrap(), Value::Int(-12));
        assert_eq!(parse_str("1.25").unwrap(), Value::Double(1.25));
        assert_eq!(parse_str("\"hi\"").unwrap(), Value::string("hi"));
    }

    #[test]
    fn containers_keep_order() {
        let value = parse_str(r#"{"b": [1, 2, {"c": null}], "a": false}"#).unwrap();
        let object = value.as_object().unwrap();
        let keys: Vec<&str> = object.keys().map(|k| &**k).collect();
        assert_eq!(keys, vec!["b", "a"]);
        let items = object.get("b").unwrap().as_array().unwrap();
        assert_eq!(items.len(), 3);
        assert_eq!(items[1], Value::Int(2));
    }

    #[test]
    fn empty_containers() {
        assert_eq!(parse_str("[]").unwrap(), Value::from(Vec::new()));
        assert_eq!(parse_str("{}").unwrap(), Value::from(Map::new()));
    }

    #[test]
    fn trailing_garbage_is_token_error() {
        assert_eq!(parse_str("1 2").unwrap_err().kind(), ErrorKind::Token);
        assert_eq!(parse_str("[1,]").unwrap_err().kind(), ErrorKind::Token);
        assert_eq!(parse_str("{\"a\":1,}").unwrap_err().kind(), ErrorKind::Token);
        assert_eq!(parse_str("{\"a\" 1}").unwrap_err().kind(), ErrorKind::Token);
    }

    #[test]
    fn depth_limit_is_enforced() {
        let options = ParserOptions { max_depth: 2 };
        assert!(parse_with_options(b"[[1]]", &options).is_ok());
        assert_eq!(
            parse_with_options(b"[[[1]]]", &options).unwrap_err().kind(),
            ErrorKind::Depth
        );
        let unlimited = ParserOptions { max_depth: 0 };
        assert!(parse_with_options(b"[[[[[[1]]]]]]", &unlimited).is_ok());
    }

    #[test]
    fn error_location_points_at_offender() {
        let err = parse_str("{\n  \"a\": tru\n}").unwrap_err();
        assert_eq!(err.location().first_line, 2);
    }
}
