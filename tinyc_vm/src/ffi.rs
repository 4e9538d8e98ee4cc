//! Foreign-function bridge: resolves `Native(name)` to a concrete native
//! routine loaded from a shared library and invokes it through a C calling
//! convention.
//!
//! Grounded directly on the bridge this language's original implementation
//! used: a `dlopen`/`dlsym` step to find a library's exported class table,
//! then a generic `ffi_prep_cif`/`ffi_call` invocation because the callee's
//! signature is only known once the descriptor is read at load time. Here
//! that's `libloading` for the load step and `libffi`'s low-level `Cif` for
//! the call step — the low-level API, not the typed `middle` one, because
//! the return type varies per descriptor and isn't known until runtime.

use std::collections::HashMap;
use std::ffi::{c_void, CStr};
use std::os::raw::c_char;
use std::path::Path;

use libffi::low::{ffi_abi_FFI_DEFAULT_ABI, ffi_cif, ffi_type, prep_cif, types, CodePtr};
use libloading::{Library, Symbol};
use thiserror::Error;

use crate::value::{Value, ValueKind};

#[derive(Debug, Error)]
pub enum FfiError {
    #[error("failed to load native library {path}: {source}")]
    LoadLibrary { path: String, source: libloading::Error },

    #[error("native library {path} has no `get_classes` export: {source}")]
    MissingSymbol { path: String, source: libloading::Error },

    #[error("unknown native function {name}")]
    UnknownNative { name: String },

    #[error("native function {name} was prepared with an unsupported C signature")]
    BadSignature { name: String },
}

/// One exported native routine, as read from a library's `get_classes`
/// table: a qualified name, its declared return/parameter kinds, and an
/// opaque function pointer taking those C parameter types.
struct NativeDescriptor {
    return_kind: ValueKind,
    param_kinds: Vec<ValueKind>,
    func: *const c_void,
}

/// The C layout a conforming shared library exports one array of, via its
/// `get_classes` symbol.
#[repr(C)]
struct RawDescriptor {
    name: *const c_char,
    return_kind: u8,
    param_kinds: *const u8,
    param_count: u32,
    func: *const c_void,
}

type GetClassesFn = unsafe extern "C" fn(out_count: *mut u32) -> *const RawDescriptor;

/// Owns every loaded `Library` handle for the VM's lifetime; dropping the
/// registry `dlclose`s them all.
pub struct NativeRegistry {
    descriptors: HashMap<String, NativeDescriptor>,
    _libraries: Vec<Library>,
}

impl NativeRegistry {
    pub fn empty() -> Self {
        Self {
            descriptors: HashMap::new(),
            _libraries: Vec::new(),
        }
    }

    /// Registers a single native function directly, without loading it from
    /// a shared library — for an embedder exposing a routine implemented in
    /// the same binary, or a test that can't `dlopen` a freshly-compiled
    /// fixture.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        return_kind: ValueKind,
        param_kinds: Vec<ValueKind>,
        func: *const c_void,
    ) {
        self.descriptors
            .insert(name.into(), NativeDescriptor { return_kind, param_kinds, func });
    }

    /// Loads every library in `paths` in order, enumerating each one's
    /// `get_classes` table. Duplicate qualified names are overwritten,
    /// last library wins.
    pub fn load_all(paths: &[impl AsRef<Path>]) -> Result<Self, FfiError> {
        let mut registry = Self::empty();
        for path in paths {
            registry.load_one(path.as_ref())?;
        }
        Ok(registry)
    }

    fn load_one(&mut self, path: &Path) -> Result<(), FfiError> {
        let display = path.display().to_string();
        let library = unsafe { Library::new(path) }
            .map_err(|source| FfiError::LoadLibrary { path: display.clone(), source })?;
        let get_classes: Symbol<GetClassesFn> = unsafe { library.get(b"get_classes\0") }
            .map_err(|source| FfiError::MissingSymbol { path: display.clone(), source })?;

        let mut count: u32 = 0;
        let raw = unsafe { get_classes(&mut count) };
        for i in 0..count as isize {
            let entry = unsafe { &*raw.offset(i) };
            let name = unsafe { CStr::from_ptr(entry.name) }.to_string_lossy().into_owned();
            let param_kinds: Vec<ValueKind> = (0..entry.param_count as isize)
                .map(|j| {
                    let tag = unsafe { *entry.param_kinds.offset(j) };
                    ValueKind::from_tag(tag).unwrap_or(ValueKind::Long)
                })
                .collect();
            let return_kind = ValueKind::from_tag(entry.return_kind).unwrap_or(ValueKind::Long);
            self.descriptors.insert(
                name,
                NativeDescriptor { return_kind, param_kinds, func: entry.func },
            );
        }

        // Keep the library mapped for the registry's lifetime; the function
        // pointers above point into it.
        self._libraries.push(library);
        Ok(())
    }

    pub fn param_kinds(&self, name: &str) -> Result<&[ValueKind], FfiError> {
        self.descriptors
            .get(name)
            .map(|d| d.param_kinds.as_slice())
            .ok_or_else(|| FfiError::UnknownNative { name: name.to_string() })
    }

    /// `(return kind, parameter kinds)` for a loaded descriptor, used by the
    /// parser to check a `@native` declaration's signature before codegen
    /// ever sees it.
    pub fn signature(&self, name: &str) -> Option<(ValueKind, &[ValueKind])> {
        self.descriptors
            .get(name)
            .map(|d| (d.return_kind, d.param_kinds.as_slice()))
    }

    /// Invokes the native function `name` with `args` (already marshalled
    /// into the declared parameter order) and returns its result.
    pub fn call(&self, name: &str, args: &[Value]) -> Result<Value, FfiError> {
        let descriptor = self
            .descriptors
            .get(name)
            .ok_or_else(|| FfiError::UnknownNative { name: name.to_string() })?;

        let mut arg_types: Vec<*mut ffi_type> = descriptor
            .param_kinds
            .iter()
            .map(|k| ffi_type_for(*k))
            .collect();
        let ret_type = ffi_type_for(descriptor.return_kind);

        let mut storage: Vec<i64> = args.iter().map(|v| v.convert(ValueKind::Long)).map(as_i64).collect();
        let mut arg_ptrs: Vec<*mut c_void> = storage
            .iter_mut()
            .map(|slot| slot as *mut i64 as *mut c_void)
            .collect();

        let mut cif: ffi_cif = unsafe { std::mem::zeroed() };
        let status = unsafe {
            prep_cif(
                &mut cif,
                ffi_abi_FFI_DEFAULT_ABI,
                arg_types.len() as u32,
                ret_type,
                arg_types.as_mut_ptr(),
            )
        };
        if status.is_err() {
            return Err(FfiError::BadSignature { name: name.to_string() });
        }

        let result: i64 = unsafe {
            libffi::low::call::<i64>(
                &mut cif,
                CodePtr::from_ptr(descriptor.func),
                arg_ptrs.as_mut_ptr(),
            )
        };

        Ok(pack_i64(result, descriptor.return_kind))
    }
}

fn as_i64(v: Value) -> i64 {
    match v {
        Value::Long(l) => l,
        _ => 0,
    }
}

fn pack_i64(raw: i64, kind: ValueKind) -> Value {
    match kind {
        ValueKind::Bool => Value::Bool(raw != 0),
        ValueKind::Char => Value::Char(raw as i8),
        ValueKind::Int => Value::Int(raw as i32),
        ValueKind::Long => Value::Long(raw),
    }
}

fn ffi_type_for(kind: ValueKind) -> *mut ffi_type {
    unsafe {
        match kind {
            ValueKind::Bool | ValueKind::Char => &mut types::sint8,
            ValueKind::Int => &mut types::sint32,
            ValueKind::Long => &mut types::sint64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_native_is_an_error() {
        let registry = NativeRegistry::empty();
        let err = registry.call("math::twice", &[Value::Long(1)]).unwrap_err();
        assert!(matches!(err, FfiError::UnknownNative { .. }));
    }
}
