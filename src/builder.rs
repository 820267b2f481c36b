use crate::map::Map;
use crate::value::Value;
use std::error;
use std::fmt;
use std::rc::Rc;

/// Misuse of the builder API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuilderError {
    /// An array operation was issued while no array is open.
    NotInArray,
    /// An object operation was issued while no object is open.
    NotInObject,
    /// The root value is already complete.
    AlreadyComplete,
    /// `finish` was called with containers still open.
    Unfinished,
}

impl fmt::Display for BuilderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            BuilderError::NotInArray => "no array is being built",
            BuilderError::NotInObject => "no object is being built",
            BuilderError::AlreadyComplete => "root value is already complete",
            BuilderError::Unfinished => "containers are still open",
        };
        f.write_str(text)
    }
}

impl error::Error for BuilderError {}

enum Container {
    Array(Vec<Value>),
    Object(Map),
}

struct Frame {
    container: Container,
    /// Key in the parent object that receives this container on end.
    key: Option<Rc<str>>,
}

/// Incremental construction of value trees for tests and schema authors.
///
/// Containers open with a `*_start` call and close with the matching
/// `*_end`; scalars are appended into whatever is currently open. The
/// finished root is taken with [`Builder::finish`].
#[derive(Default)]
pub struct Builder {
    stack: Vec<Frame>,
    root: Option<Value>,
}

impl Builder {
    pub fn new() -> Builder {
        Builder::default()
    }

    /// Open an array at the root or inside the currently open array.
    pub fn array_start(&mut self) -> Result<(), BuilderError> {
        self.container_start(Container::Array(Vec::new()), None)
    }

    /// Open an object at the root or inside the currently open array.
    pub fn object_start(&mut self) -> Result<(), BuilderError> {
        self.container_start(Container::Object(Map::new()), None)
    }

    /// Append a scalar (or prebuilt value) to the open array.
    pub fn array_push<V: Into<Value>>(&mut self, value: V) -> Result<(), BuilderError> {
        match self.stack.last_mut() {
            Some(Frame {
                container: Container::Array(items),
                ..
            }) => {
                items.push(value.into());
                Ok(())
            }
            _ => Err(BuilderError::NotInArray),
        }
    }

    /// Open an array as the next element of the open array.
    pub fn array_push_array(&mut self) -> Result<(), BuilderError> {
        self.expect_array()?;
        self.stack.push(Frame {
            container: Container::Array(Vec::new()),
            key: None,
        });
        Ok(())
    }

    /// Open an object as the next element of the open array.
    pub fn array_push_object(&mut self) -> Result<(), BuilderError> {
        self.expect_array()?;
        self.stack.push(Frame {
            container: Container::Object(Map::new()),
            key: None,
        });
        Ok(())
    }

    /// Add a member to the open object.
    pub fn object_add<V: Into<Value>>(&mut self, key: &str, value: V) -> Result<(), BuilderError> {
        match self.stack.last_mut() {
            Some(Frame {
                container: Container::Object(map),
                ..
            }) => {
                map.insert(Rc::from(key), value.into());
                Ok(())
            }
            _ => Err(BuilderError::NotInObject),
        }
    }

    /// Open an array as the value of `key` in the open object.
    pub fn object_add_array(&mut self, key: &str) -> Result<(), BuilderError> {
        self.expect_object()?;
        self.stack.push(Frame {
            container: Container::Array(Vec::new()),
            key: Some(Rc::from(key)),
        });
        Ok(())
    }

    /// Open an object as the value of `key` in the open object.
    pub fn object_add_object(&mut self, key: &str) -> Result<(), BuilderError> {
        self.expect_object()?;
        self.stack.push(Frame {
            container: Container::Object(Map::new()),
            key: Some(Rc::from(key)),
        });
        Ok(())
    }

    /// Close the open array.
    pub fn array_end(&mut self) -> Result<(), BuilderError> {
        match self.stack.last() {
            Some(Frame {
                container: Container::Array(_),
                ..
            }) => self.container_end(),
            _ => Err(BuilderError::NotInArray),
        }
    }

    /// Close the open object.
    pub fn object_end(&mut self) -> Result<(), BuilderError> {
        match self.stack.last() {
            Some(Frame {
                container: Container::Object(_),
                ..
            }) => self.container_end(),
            _ => Err(BuilderError::NotInObject),
        }
    }

    /// Take the completed root value.
    pub fn finish(self) -> Result<Value, BuilderError> {
        if !self.stack.is_empty() {
            return Err(BuilderError::Unfinished);
        }
        self.root.ok_or(BuilderError::Unfinished)
    }

    fn container_start(
        &mut self,
        container: Container,
        key: Option<Rc<str>>,
    ) -> Result<(), BuilderError> {
        if self.stack.is_empty() && self.root.is_some() {
            return Err(BuilderError::AlreadyComplete);
        }
        if let Some(Frame {
            container: Container::Object(_),
            ..
        }) = self.stack.last()
        {
            if key.is_none() {
                // Inside an object every container needs a key; use the
                // object_add_* variants there.
                return Err(BuilderError::NotInObject);
            }
        }
        self.stack.push(Frame { container, key });
        Ok(())
    }

    fn container_end(&mut self) -> Result<(), BuilderError> {
        let frame = self.stack.pop().expect("caller checked the top frame");
        let value = match frame.container {
            Container::Array(items) => Value::Array(Rc::new(items)),
            Container::Object(map) => Value::Object(Rc::new(map)),
        };
        match self.stack.last_mut() {
            None => {
                self.root = Some(value);
                Ok(())
            }
            Some(parent) => match (&mut parent.container, frame.key) {
                (Container::Array(items), None) => {
                    items.push(value);
                    Ok(())
                }
                (Container::Object(map), Some(key)) => {
                    map.insert(key, value);
                    Ok(())
                }
                _ => Err(BuilderError::NotInObject),
            },
        }
    }

    fn expect_array(&self) -> Result<(), BuilderError> {
        match self.stack.last() {
            Some(Frame {
                container: Container::Array(_),
                ..
            }) => Ok(()),
            _ => Err(BuilderError::NotInArray),
        }
    }

    fn expect_object(&self) -> Result<(), BuilderError> {
        match self.stack.last() {
            Some(Frame {
                container: Container::Object(_),
                ..
            }) => Ok(()),
            _ => Err(BuilderError::NotInObject),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    #[test]
    fn builds_nested_document() {
        let mut builder = Builder::new();
        builder.object_start().unwrap();
        builder.object_add("name", "main").unwrap();
        builder.object_add_array("items").unwrap();
        builder.array_push(1i64).unwrap();
        builder.array_push_object().unwrap();
        builder.object_add("ok", true).unwrap();
        builder.object_end().unwrap();
        builder.array_end().unwrap();
        builder.object_add("limit", 2.5f64).unwrap();
        builder.object_end().unwrap();
        let built = builder.finish().unwrap();

        let expected = parse(br#"{"name":"main","items":[1,{"ok":true}],"limit":2.5}"#).unwrap();
        assert_eq!(built, expected);
    }

    #[test]
    fn misuse_is_reported() {
        let mut builder = Builder::new();
        assert_eq!(builder.array_push(1i64), Err(BuilderError::NotInArray));
        builder.array_start().unwrap();
        assert_eq!(builder.object_add("k", 1i64), Err(BuilderError::NotInObject));
        assert_eq!(builder.object_end(), Err(BuilderError::NotInObject));
        builder.array_end().unwrap();
        assert_eq!(builder.array_start(), Err(BuilderError::AlreadyComplete));
    }

    #[test]
    fn unfinished_root_is_an_error() {
        let mut builder = Builder::new();
        builder.object_start().unwrap();
        assert_eq!(builder.finish().unwrap_err(), BuilderError::Unfinished);
        assert_eq!(Builder::new().finish().unwrap_err(), BuilderError::Unfinished);
    }
}
