use std::{cell::RefCell, collections::HashMap, rc::Rc};

use crate::{
    color::ColorSpace,
    error::PdfResult,
    objects::{Dictionary, Name, Object},
    shading::Shading,
    xobject::XObject,
    FromObj, Resolve,
};

use self::{graphics_state_parameters::GraphicsStateParameters, pattern::Pattern};

pub mod graphics_state_parameters;
pub mod pattern;

/// A resource dictionary: the name-to-object maps a content stream draws
/// from. Category subdictionaries are kept raw; entries are parsed on
/// first use
#[derive(Debug, Clone, Default)]
pub struct Resources {
    /// A dictionary that maps resource names to
    /// graphics state parameter dictionaries
    ext_g_state: Option<Dictionary>,

    /// A dictionary that maps each resource name to
    /// either the name of a device-dependent color
    /// space or an array describing a color space
    color_space: Option<Dictionary>,

    /// A dictionary that maps resource names to pattern objects
    pattern: Option<Dictionary>,

    /// A dictionary that maps resource names to shading dictionaries
    shading: Option<Dictionary>,

    /// A dictionary that maps resource names to external objects
    xobject: Option<Dictionary>,

    /// A dictionary that maps resource names to font dictionaries
    font: Option<Dictionary>,

    /// An array of predefined procedure set names
    proc_set: Option<Vec<ProcedureSet>>,

    properties: Option<Dictionary>,
}

impl Resources {
    pub fn from_dict(mut dict: Dictionary, resolver: &mut dyn Resolve) -> PdfResult<Self> {
        let ext_g_state = dict.get_dict("ExtGState", resolver)?;
        let color_space = dict.get_dict("ColorSpace", resolver)?;
        let pattern = dict.get_dict("Pattern", resolver)?;
        let shading = dict.get_dict("Shading", resolver)?;
        let xobject = dict.get_dict("XObject", resolver)?;
        let font = dict.get_dict("Font", resolver)?;

        let proc_set = dict
            .get_arr("ProcSet", resolver)?
            .map(|proc| {
                proc.into_iter()
                    .filter_map(|proc| {
                        let name = resolver.assert_name(proc).ok()?;
                        ProcedureSet::from_str(&name).ok()
                    })
                    .collect::<Vec<ProcedureSet>>()
            })
            .filter(|sets| !sets.is_empty());

        let properties = dict.get_dict("Properties", resolver)?;

        Ok(Resources {
            ext_g_state,
            color_space,
            pattern,
            shading,
            xobject,
            font,
            proc_set,
            properties,
        })
    }

    fn raw(category: &Option<Dictionary>, name: &str) -> Option<Object> {
        category.as_ref().and_then(|dict| dict.peek(name).cloned())
    }
}

#[pdf_enum]
pub enum ProcedureSet {
    Pdf = "PDF",
    Text = "Text",
    ImageB = "ImageB",
    ImageC = "ImageC",
    ImageI = "ImageI",
}

/// A font resource as the interpreter sees it: the name it was selected by
/// and its raw dictionary. Glyph selection and metrics live behind the
/// text-shaper seam
#[derive(Debug, Clone)]
pub struct FontResource {
    pub name: Name,
    pub dict: Dictionary,
}

/// A resource dictionary paired with its name-to-parsed-resource
/// memoization. Pages hold one for their lifetime; forms and tiling
/// patterns with their own resources get transient ones
#[derive(Debug)]
pub struct ResourceSet {
    resources: Resources,
    cache: RefCell<ResourceCache>,
}

#[derive(Debug, Default)]
struct ResourceCache {
    color_spaces: HashMap<String, ColorSpace>,
    patterns: HashMap<String, Rc<Pattern>>,
    shadings: HashMap<String, Rc<Shading>>,
    xobjects: HashMap<String, Rc<XObject>>,
    ext_g_states: HashMap<String, Rc<GraphicsStateParameters>>,
    fonts: HashMap<String, Rc<FontResource>>,
}

impl ResourceSet {
    pub fn new(resources: Resources) -> Self {
        Self {
            resources,
            cache: RefCell::new(ResourceCache::default()),
        }
    }

    pub fn empty() -> Self {
        Self::new(Resources::default())
    }

    pub fn resources(&self) -> &Resources {
        &self.resources
    }

    /// Resolve a named color space. Device family names first consult the
    /// page's Default* overrides
    pub fn color_space(
        &self,
        name: &str,
        resolver: &mut dyn Resolve,
    ) -> PdfResult<Option<ColorSpace>> {
        if let Some(space) = self.cache.borrow().color_spaces.get(name) {
            return Ok(Some(space.clone()));
        }

        let default_override = match name {
            "DeviceGray" => Resources::raw(&self.resources.color_space, "DefaultGray"),
            "DeviceRGB" => Resources::raw(&self.resources.color_space, "DefaultRGB"),
            "DeviceCMYK" => Resources::raw(&self.resources.color_space, "DefaultCMYK"),
            _ => None,
        };

        let requested_device = match name {
            "DeviceGray" => Some(ColorSpace::DeviceGray),
            "DeviceRGB" => Some(ColorSpace::DeviceRgb),
            "DeviceCMYK" => Some(ColorSpace::DeviceCmyk),
            _ => None,
        };

        let obj = default_override.or_else(|| Resources::raw(&self.resources.color_space, name));

        let space = match obj {
            Some(obj) => {
                let resolved = ColorSpace::from_obj(obj, resolver)?;

                // a Default* override must be compatible with the device
                // family it replaces
                match requested_device {
                    Some(device) if resolved.components() != device.components() => Some(device),
                    _ => Some(resolved),
                }
            }
            None => None,
        };

        if let Some(space) = &space {
            self.cache
                .borrow_mut()
                .color_spaces
                .insert(name.to_owned(), space.clone());
        }

        Ok(space)
    }

    pub fn pattern(&self, name: &str, resolver: &mut dyn Resolve) -> PdfResult<Option<Rc<Pattern>>> {
        if let Some(pattern) = self.cache.borrow().patterns.get(name) {
            return Ok(Some(Rc::clone(pattern)));
        }

        let pattern = match Resources::raw(&self.resources.pattern, name) {
            Some(obj) => {
                let object_number = match &obj {
                    Object::Reference(reference) => Some(reference.object_number),
                    _ => None,
                };

                let mut pattern = Pattern::from_obj(obj, resolver)?;

                // tiling cells are guarded by the object number they came
                // from, like form XObjects
                if let Pattern::Tiling(tiling) = &mut pattern {
                    tiling.object_number = object_number;
                }

                Rc::new(pattern)
            }
            None => return Ok(None),
        };

        self.cache
            .borrow_mut()
            .patterns
            .insert(name.to_owned(), Rc::clone(&pattern));

        Ok(Some(pattern))
    }

    pub fn shading(&self, name: &str, resolver: &mut dyn Resolve) -> PdfResult<Option<Rc<Shading>>> {
        if let Some(shading) = self.cache.borrow().shadings.get(name) {
            return Ok(Some(Rc::clone(shading)));
        }

        let shading = match Resources::raw(&self.resources.shading, name) {
            Some(obj) => Rc::new(Shading::from_obj(obj, resolver)?),
            None => return Ok(None),
        };

        self.cache
            .borrow_mut()
            .shadings
            .insert(name.to_owned(), Rc::clone(&shading));

        Ok(Some(shading))
    }

    pub fn xobject(&self, name: &str, resolver: &mut dyn Resolve) -> PdfResult<Option<Rc<XObject>>> {
        if let Some(xobject) = self.cache.borrow().xobjects.get(name) {
            return Ok(Some(Rc::clone(xobject)));
        }

        let obj = match Resources::raw(&self.resources.xobject, name) {
            Some(obj) => obj,
            None => return Ok(None),
        };

        // remember which indirect object this was: the recursion guard
        // tracks object numbers
        let object_number = match &obj {
            Object::Reference(reference) => Some(reference.object_number),
            _ => None,
        };

        let stream = resolver.assert_stream(obj)?;
        let xobject = Rc::new(XObject::from_stream(stream, object_number, resolver)?);

        self.cache
            .borrow_mut()
            .xobjects
            .insert(name.to_owned(), Rc::clone(&xobject));

        Ok(Some(xobject))
    }

    pub fn ext_g_state(
        &self,
        name: &str,
        resolver: &mut dyn Resolve,
    ) -> PdfResult<Option<Rc<GraphicsStateParameters>>> {
        if let Some(params) = self.cache.borrow().ext_g_states.get(name) {
            return Ok(Some(Rc::clone(params)));
        }

        let params = match Resources::raw(&self.resources.ext_g_state, name) {
            Some(obj) => {
                let dict = resolver.assert_dict(obj)?;
                Rc::new(GraphicsStateParameters::from_dict(dict, resolver)?)
            }
            None => return Ok(None),
        };

        self.cache
            .borrow_mut()
            .ext_g_states
            .insert(name.to_owned(), Rc::clone(&params));

        Ok(Some(params))
    }

    pub fn font(&self, name: &str, resolver: &mut dyn Resolve) -> PdfResult<Option<Rc<FontResource>>> {
        if let Some(font) = self.cache.borrow().fonts.get(name) {
            return Ok(Some(Rc::clone(font)));
        }

        let font = match Resources::raw(&self.resources.font, name) {
            Some(obj) => Rc::new(FontResource {
                name: Name(name.to_owned()),
                dict: resolver.assert_dict(obj)?,
            }),
            None => return Ok(None),
        };

        self.cache
            .borrow_mut()
            .fonts
            .insert(name.to_owned(), Rc::clone(&font));

        Ok(Some(font))
    }
}
