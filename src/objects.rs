use std::{collections::HashMap, fmt, rc::Rc};

use crate::{error::ParseError, error::PdfResult, stream::Stream, Resolve};

#[derive(Debug, Clone, Copy)]
pub enum ObjectType {
    Null,
    Boolean,
    Integer,
    Real,
    String,
    Name,
    Array,
    Stream,
    Dictionary,
    Reference,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Object {
    Null,
    True,
    False,
    Integer(i32),
    Real(f32),
    String(String),
    Name(Name),
    Array(Vec<Self>),
    Stream(Stream),
    Dictionary(Dictionary),
    Reference(Reference),
}

impl Object {
    pub fn ty(&self) -> ObjectType {
        match self {
            Object::Null => ObjectType::Null,
            Object::True | Object::False => ObjectType::Boolean,
            Object::Integer(..) => ObjectType::Integer,
            Object::Real(..) => ObjectType::Real,
            Object::String(..) => ObjectType::String,
            Object::Name(..) => ObjectType::Name,
            Object::Array(..) => ObjectType::Array,
            Object::Stream(..) => ObjectType::Stream,
            Object::Dictionary(..) => ObjectType::Dictionary,
            Object::Reference(..) => ObjectType::Reference,
        }
    }

    pub fn name_is(&self, name: &str) -> bool {
        matches!(self, Object::Name(n) if n == name)
    }
}

/// A name object is an atomic symbol uniquely defined by a sequence of
/// bytes. No encoding is implied; two names are equal exactly when their
/// bytes are equal
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub struct Name(pub String);

impl Name {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}", self.0)
    }
}

impl PartialEq<&str> for Name {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl PartialEq<str> for Name {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

/// A reference to a non-existing object is considered a `null`
#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq)]
pub struct Reference {
    pub object_number: usize,
    pub generation: usize,
}

impl Reference {
    pub fn is_valid(&self) -> bool {
        self.object_number > 0
    }
}

pub trait FromObj: Sized {
    fn from_obj(obj: Object, resolver: &mut dyn Resolve) -> PdfResult<Self>;
}

impl FromObj for Object {
    fn from_obj(obj: Object, _resolver: &mut dyn Resolve) -> PdfResult<Self> {
        Ok(obj)
    }
}

impl FromObj for i32 {
    fn from_obj(obj: Object, resolver: &mut dyn Resolve) -> PdfResult<Self> {
        resolver.assert_integer(obj)
    }
}

impl FromObj for u32 {
    fn from_obj(obj: Object, resolver: &mut dyn Resolve) -> PdfResult<Self> {
        resolver.assert_unsigned_integer(obj)
    }
}

impl FromObj for u8 {
    fn from_obj(obj: Object, resolver: &mut dyn Resolve) -> PdfResult<Self> {
        Ok(u8::try_from(resolver.assert_unsigned_integer(obj)?)?)
    }
}

impl FromObj for f32 {
    fn from_obj(obj: Object, resolver: &mut dyn Resolve) -> PdfResult<Self> {
        resolver.assert_number(obj)
    }
}

impl FromObj for bool {
    fn from_obj(obj: Object, resolver: &mut dyn Resolve) -> PdfResult<Self> {
        resolver.assert_bool(obj)
    }
}

impl FromObj for String {
    fn from_obj(obj: Object, resolver: &mut dyn Resolve) -> PdfResult<Self> {
        resolver.assert_string(obj)
    }
}

impl FromObj for Name {
    fn from_obj(obj: Object, resolver: &mut dyn Resolve) -> PdfResult<Self> {
        Ok(Name(resolver.assert_name(obj)?))
    }
}

impl FromObj for Reference {
    fn from_obj(obj: Object, _resolver: &mut dyn Resolve) -> PdfResult<Self> {
        assert_reference(obj)
    }
}

impl FromObj for Stream {
    fn from_obj(obj: Object, resolver: &mut dyn Resolve) -> PdfResult<Self> {
        resolver.assert_stream(obj)
    }
}

impl FromObj for Dictionary {
    fn from_obj(obj: Object, resolver: &mut dyn Resolve) -> PdfResult<Self> {
        resolver.assert_dict(obj)
    }
}

impl<T: FromObj> FromObj for Vec<T> {
    fn from_obj(obj: Object, resolver: &mut dyn Resolve) -> PdfResult<Self> {
        resolver
            .assert_arr(obj)?
            .into_iter()
            .map(|obj| T::from_obj(obj, resolver))
            .collect()
    }
}

impl<T: FromObj> FromObj for Box<T> {
    fn from_obj(obj: Object, resolver: &mut dyn Resolve) -> PdfResult<Self> {
        Ok(Box::new(T::from_obj(obj, resolver)?))
    }
}

impl<T: FromObj> FromObj for Rc<T> {
    fn from_obj(obj: Object, resolver: &mut dyn Resolve) -> PdfResult<Self> {
        Ok(Rc::new(T::from_obj(obj, resolver)?))
    }
}

impl<T: FromObj> FromObj for HashMap<String, T> {
    fn from_obj(obj: Object, resolver: &mut dyn Resolve) -> PdfResult<Self> {
        resolver
            .assert_dict(obj)?
            .entries()
            .map(|(key, value)| Ok((key, T::from_obj(value, resolver)?)))
            .collect()
    }
}

impl<const N: usize> FromObj for [f32; N] {
    fn from_obj(obj: Object, resolver: &mut dyn Resolve) -> PdfResult<Self> {
        let arr = <Vec<f32>>::from_obj(obj, resolver)?;
        crate::assert_len(arr.len(), N)?;

        Ok(<[f32; N]>::try_from(arr).unwrap())
    }
}

/// Either a single value or an array of that value. PDF allows this for
/// filters and their parameter dictionaries
#[derive(Debug, Clone, PartialEq)]
pub enum TypeOrArray<T> {
    Type(T),
    Array(Vec<T>),
}

impl<T> TypeOrArray<T> {
    pub fn to_vec(self) -> Vec<T> {
        match self {
            TypeOrArray::Type(t) => vec![t],
            TypeOrArray::Array(arr) => arr,
        }
    }
}

impl<T: FromObj> FromObj for TypeOrArray<T> {
    fn from_obj(obj: Object, resolver: &mut dyn Resolve) -> PdfResult<Self> {
        Ok(match resolver.resolve(obj)? {
            Object::Array(arr) => TypeOrArray::Array(
                arr.into_iter()
                    .map(|obj| T::from_obj(obj, resolver))
                    .collect::<PdfResult<Vec<T>>>()?,
            ),
            obj => TypeOrArray::Type(T::from_obj(obj, resolver)?),
        })
    }
}

pub fn assert_reference(obj: Object) -> PdfResult<Reference> {
    match obj {
        Object::Reference(r) => Ok(r),
        obj => anyhow::bail!("expected reference, found {:?}", obj),
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dictionary {
    dict: HashMap<String, Object>,
}

impl Dictionary {
    pub fn new(dict: HashMap<String, Object>) -> Self {
        Self { dict }
    }

    pub fn empty() -> Self {
        Self {
            dict: HashMap::new(),
        }
    }

    pub fn get<T: FromObj>(
        &mut self,
        key: &str,
        resolver: &mut dyn Resolve,
    ) -> PdfResult<Option<T>> {
        self.dict
            .remove(key)
            .map(|obj| T::from_obj(obj, resolver))
            .transpose()
    }

    pub fn expect<T: FromObj>(
        &mut self,
        key: &'static str,
        resolver: &mut dyn Resolve,
    ) -> PdfResult<T> {
        match self.dict.remove(key) {
            Some(obj) => T::from_obj(obj, resolver),
            None => anyhow::bail!(ParseError::MissingRequiredKey { key }),
        }
    }

    pub fn get_object(&mut self, key: &str) -> Option<Object> {
        self.dict.remove(key)
    }

    pub fn peek(&self, key: &str) -> Option<&Object> {
        self.dict.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.dict.contains_key(key)
    }

    pub fn insert(&mut self, key: String, obj: Object) {
        self.dict.insert(key, obj);
    }

    pub fn is_empty(&self) -> bool {
        self.dict.is_empty()
    }

    pub fn entries(&mut self) -> impl Iterator<Item = (String, Object)> + '_ {
        self.dict.drain()
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.dict.keys()
    }

    /// Assert that the dictionary's /Type entry, if present (or if
    /// `required`), matches `expected`
    pub fn expect_type(
        &mut self,
        expected: &'static str,
        resolver: &mut dyn Resolve,
        required: bool,
    ) -> PdfResult<()> {
        let ty = match self.get::<Name>("Type", resolver)? {
            Some(ty) => ty,
            None if !required => return Ok(()),
            None => anyhow::bail!(ParseError::MissingRequiredKey { key: "Type" }),
        };

        if ty != expected {
            anyhow::bail!(ParseError::MismatchedTypeKey {
                expected,
                found: ty.0,
            });
        }

        Ok(())
    }

    pub fn get_integer(&mut self, key: &str, resolver: &mut dyn Resolve) -> PdfResult<Option<i32>> {
        self.get::<i32>(key, resolver)
    }

    pub fn expect_integer(&mut self, key: &'static str, resolver: &mut dyn Resolve) -> PdfResult<i32> {
        self.expect::<i32>(key, resolver)
    }

    pub fn expect_unsigned_integer(
        &mut self,
        key: &'static str,
        resolver: &mut dyn Resolve,
    ) -> PdfResult<u32> {
        self.expect::<u32>(key, resolver)
    }

    pub fn get_number(&mut self, key: &str, resolver: &mut dyn Resolve) -> PdfResult<Option<f32>> {
        self.get::<f32>(key, resolver)
    }

    pub fn expect_number(&mut self, key: &'static str, resolver: &mut dyn Resolve) -> PdfResult<f32> {
        self.expect::<f32>(key, resolver)
    }

    pub fn get_name(&mut self, key: &str, resolver: &mut dyn Resolve) -> PdfResult<Option<Name>> {
        self.get::<Name>(key, resolver)
    }

    pub fn expect_name(&mut self, key: &'static str, resolver: &mut dyn Resolve) -> PdfResult<Name> {
        self.expect::<Name>(key, resolver)
    }

    pub fn get_dict(
        &mut self,
        key: &str,
        resolver: &mut dyn Resolve,
    ) -> PdfResult<Option<Dictionary>> {
        self.get::<Dictionary>(key, resolver)
    }

    pub fn expect_dict(
        &mut self,
        key: &'static str,
        resolver: &mut dyn Resolve,
    ) -> PdfResult<Dictionary> {
        self.expect::<Dictionary>(key, resolver)
    }

    pub fn get_arr(
        &mut self,
        key: &str,
        resolver: &mut dyn Resolve,
    ) -> PdfResult<Option<Vec<Object>>> {
        self.get::<Vec<Object>>(key, resolver)
    }

    pub fn expect_arr(
        &mut self,
        key: &'static str,
        resolver: &mut dyn Resolve,
    ) -> PdfResult<Vec<Object>> {
        self.expect::<Vec<Object>>(key, resolver)
    }

    pub fn get_bool(&mut self, key: &str, resolver: &mut dyn Resolve) -> PdfResult<Option<bool>> {
        self.get::<bool>(key, resolver)
    }

    pub fn get_stream(
        &mut self,
        key: &str,
        resolver: &mut dyn Resolve,
    ) -> PdfResult<Option<Stream>> {
        self.get::<Stream>(key, resolver)
    }

    pub fn get_string(
        &mut self,
        key: &str,
        resolver: &mut dyn Resolve,
    ) -> PdfResult<Option<String>> {
        self.get::<String>(key, resolver)
    }

    pub fn get_reference(&mut self, key: &str) -> PdfResult<Option<Reference>> {
        self.dict.remove(key).map(assert_reference).transpose()
    }
}

impl FromIterator<(String, Object)> for Dictionary {
    fn from_iter<I: IntoIterator<Item = (String, Object)>>(iter: I) -> Self {
        Self {
            dict: iter.into_iter().collect(),
        }
    }
}
