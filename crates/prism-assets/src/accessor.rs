//! Typed accessor decoding.
//!
//! An [`AccessorDesc`] describes a strided view of numeric vectors inside a raw buffer.
//! Decoding widens every supported component type to `f32` (attributes) or `u32`
//! (indices), normalizing integer data when the accessor asks for it.

use gltf::accessor::sparse::IndexType;
use gltf::accessor::{DataType, Dimensions};

use crate::error::DecodeError;

/// Numeric type of a single vector component.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentType {
    I8,
    U8,
    I16,
    U16,
    U32,
    F32,
}

impl ComponentType {
    /// Size in bytes.
    pub fn size(self) -> usize {
        match self {
            ComponentType::I8 | ComponentType::U8 => 1,
            ComponentType::I16 | ComponentType::U16 => 2,
            ComponentType::U32 | ComponentType::F32 => 4,
        }
    }

    /// Whether indices may be stored with this type.
    pub fn is_index(self) -> bool {
        matches!(
            self,
            ComponentType::U8 | ComponentType::U16 | ComponentType::U32
        )
    }

    /// Read one little-endian component as a float.
    ///
    /// Normalized unsigned values map to `[0, 1]`, normalized signed values to `[-1, 1]`.
    fn read_f32(self, b: &[u8], normalized: bool) -> f32 {
        match self {
            ComponentType::I8 => {
                let v = f32::from(b[0] as i8);
                if normalized {
                    (v / 127.0).max(-1.0)
                } else {
                    v
                }
            }
            ComponentType::U8 => {
                let v = f32::from(b[0]);
                if normalized {
                    v / 255.0
                } else {
                    v
                }
            }
            ComponentType::I16 => {
                let v = f32::from(i16::from_le_bytes([b[0], b[1]]));
                if normalized {
                    (v / 32767.0).max(-1.0)
                } else {
                    v
                }
            }
            ComponentType::U16 => {
                let v = f32::from(u16::from_le_bytes([b[0], b[1]]));
                if normalized {
                    v / 65535.0
                } else {
                    v
                }
            }
            ComponentType::U32 => {
                let v = u32::from_le_bytes([b[0], b[1], b[2], b[3]]);
                if normalized {
                    (f64::from(v) / f64::from(u32::MAX)) as f32
                } else {
                    v as f32
                }
            }
            ComponentType::F32 => f32::from_le_bytes([b[0], b[1], b[2], b[3]]),
        }
    }

    /// Read one little-endian unsigned component widened to `u32`.
    fn read_u32(self, b: &[u8]) -> u32 {
        match self {
            ComponentType::U8 => u32::from(b[0]),
            ComponentType::U16 => u32::from(u16::from_le_bytes([b[0], b[1]])),
            ComponentType::U32 => u32::from_le_bytes([b[0], b[1], b[2], b[3]]),
            _ => unreachable!("read_u32 on non-index component type {self:?}"),
        }
    }
}

impl From<DataType> for ComponentType {
    fn from(data_type: DataType) -> Self {
        match data_type {
            DataType::I8 => ComponentType::I8,
            DataType::U8 => ComponentType::U8,
            DataType::I16 => ComponentType::I16,
            DataType::U16 => ComponentType::U16,
            DataType::U32 => ComponentType::U32,
            DataType::F32 => ComponentType::F32,
        }
    }
}

/// Logical vector type of an accessor element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementType {
    Scalar,
    Vec2,
    Vec3,
    Vec4,
    Mat2,
    Mat3,
    Mat4,
}

impl ElementType {
    /// Number of components per element.
    pub fn arity(self) -> usize {
        match self {
            ElementType::Scalar => 1,
            ElementType::Vec2 => 2,
            ElementType::Vec3 => 3,
            ElementType::Vec4 | ElementType::Mat2 => 4,
            ElementType::Mat3 => 9,
            ElementType::Mat4 => 16,
        }
    }

    pub fn is_matrix(self) -> bool {
        matches!(self, ElementType::Mat2 | ElementType::Mat3 | ElementType::Mat4)
    }
}

impl From<Dimensions> for ElementType {
    fn from(dimensions: Dimensions) -> Self {
        match dimensions {
            Dimensions::Scalar => ElementType::Scalar,
            Dimensions::Vec2 => ElementType::Vec2,
            Dimensions::Vec3 => ElementType::Vec3,
            Dimensions::Vec4 => ElementType::Vec4,
            Dimensions::Mat2 => ElementType::Mat2,
            Dimensions::Mat3 => ElementType::Mat3,
            Dimensions::Mat4 => ElementType::Mat4,
        }
    }
}

/// A buffer view: the byte range `start..end` of buffer `buffer`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRegion {
    pub buffer: usize,
    pub start: usize,
    pub end: usize,
}

impl ByteRegion {
    pub fn new(buffer: usize, start: usize, length: usize) -> Self {
        Self {
            buffer,
            start,
            end: start + length,
        }
    }

    fn from_view(view: &gltf::buffer::View<'_>) -> Self {
        Self::new(view.buffer().index(), view.offset(), view.length())
    }

    /// Borrow `len` bytes starting `offset` bytes into the region.
    fn slice<'a>(
        &self,
        accessor: usize,
        buffers: &'a [Vec<u8>],
        offset: usize,
        len: usize,
    ) -> Result<&'a [u8], DecodeError> {
        let buffer = buffers.get(self.buffer).ok_or(DecodeError::MissingBuffer {
            accessor,
            buffer: self.buffer,
        })?;
        let limit = self.end.min(buffer.len());
        let start = self.start.saturating_add(offset);
        let end = start.saturating_add(len);
        if end > limit {
            return Err(DecodeError::OutOfBounds {
                accessor,
                start,
                end,
                limit,
            });
        }
        Ok(&buffer[start..end])
    }
}

/// Sparse substitution block applied over an accessor's base values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SparseDesc {
    pub count: usize,
    pub index_type: ComponentType,
    pub indices: ByteRegion,
    pub indices_offset: usize,
    pub values: ByteRegion,
    pub values_offset: usize,
}

impl SparseDesc {
    fn from_gltf(sparse: &gltf::accessor::sparse::Sparse<'_>) -> Self {
        let indices = sparse.indices();
        let values = sparse.values();
        Self {
            count: sparse.count() as usize,
            index_type: match indices.index_type() {
                IndexType::U8 => ComponentType::U8,
                IndexType::U16 => ComponentType::U16,
                IndexType::U32 => ComponentType::U32,
            },
            indices: ByteRegion::from_view(&indices.view()),
            indices_offset: indices.offset() as usize,
            values: ByteRegion::from_view(&values.view()),
            values_offset: values.offset() as usize,
        }
    }
}

/// Transient description of a typed, strided view into a raw buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessorDesc {
    /// Index of the accessor in its document, used for diagnostics.
    pub index: usize,
    pub component_type: ComponentType,
    pub element_type: ElementType,
    pub count: usize,
    pub normalized: bool,
    /// Buffer view holding the data. `None` means every element is zero.
    pub view: Option<ByteRegion>,
    /// Offset of the first element relative to the view start.
    pub byte_offset: usize,
    /// Explicit distance between elements; tightly packed when `None`.
    pub byte_stride: Option<usize>,
    pub sparse: Option<SparseDesc>,
}

impl AccessorDesc {
    /// An accessor with no backing view.
    pub fn new(
        index: usize,
        component_type: ComponentType,
        element_type: ElementType,
        count: usize,
    ) -> Self {
        Self {
            index,
            component_type,
            element_type,
            count,
            normalized: false,
            view: None,
            byte_offset: 0,
            byte_stride: None,
            sparse: None,
        }
    }

    pub fn with_view(mut self, view: ByteRegion, byte_offset: usize) -> Self {
        self.view = Some(view);
        self.byte_offset = byte_offset;
        self
    }

    pub fn with_stride(mut self, byte_stride: usize) -> Self {
        self.byte_stride = Some(byte_stride);
        self
    }

    pub fn normalized(mut self, normalized: bool) -> Self {
        self.normalized = normalized;
        self
    }

    pub fn with_sparse(mut self, sparse: SparseDesc) -> Self {
        self.sparse = Some(sparse);
        self
    }

    pub fn from_gltf(accessor: &gltf::Accessor<'_>) -> Self {
        let view = accessor.view();
        Self {
            index: accessor.index(),
            component_type: accessor.data_type().into(),
            element_type: accessor.dimensions().into(),
            count: accessor.count(),
            normalized: accessor.normalized(),
            view: view.as_ref().map(ByteRegion::from_view),
            byte_offset: accessor.offset(),
            byte_stride: view.as_ref().and_then(|v| v.stride()),
            sparse: accessor.sparse().map(|s| SparseDesc::from_gltf(&s)),
        }
    }

    /// Native number of components per element.
    pub fn arity(&self) -> usize {
        self.element_type.arity()
    }

    /// Bytes occupied by one tightly packed element.
    pub fn element_size(&self) -> usize {
        self.component_type.size() * self.arity()
    }

    /// Distance in bytes between consecutive elements.
    pub fn stride(&self) -> usize {
        self.byte_stride.unwrap_or_else(|| self.element_size())
    }

    /// Bounds-checked bytes covering every element, or `None` for a view-less accessor.
    fn element_bytes<'a>(&self, buffers: &'a [Vec<u8>]) -> Result<Option<&'a [u8]>, DecodeError> {
        let Some(view) = &self.view else {
            return Ok(None);
        };
        let element_size = self.element_size();
        let stride = self.stride();
        if stride < element_size {
            return Err(DecodeError::StrideTooSmall {
                accessor: self.index,
                stride,
                element_size,
            });
        }
        let len = match self.count {
            0 => 0,
            n => (n - 1).saturating_mul(stride).saturating_add(element_size),
        };
        view.slice(self.index, buffers, self.byte_offset, len).map(Some)
    }

    /// Decode every element as floats, producing `count * arity` values.
    ///
    /// Components beyond the accessor's native arity are zero-filled; extra native
    /// components are dropped.
    pub fn read_floats(&self, buffers: &[Vec<u8>], arity: usize) -> Result<Vec<f32>, DecodeError> {
        debug_assert!(arity > 0, "output arity must be non-zero");
        if self.element_type.is_matrix() {
            return Err(DecodeError::UnsupportedElementType {
                accessor: self.index,
                element: self.element_type,
                usage: "vertex attributes",
            });
        }

        // Regions are validated before the output is allocated.
        let base = self.element_bytes(buffers)?;
        let substitutions = match &self.sparse {
            Some(sparse) => Some((
                self.sparse_indices(sparse, buffers)?,
                sparse.values.slice(
                    self.index,
                    buffers,
                    sparse.values_offset,
                    sparse.count.saturating_mul(self.element_size()),
                )?,
            )),
            None => None,
        };

        let mut out = self.zeroed(arity, 0.0)?;
        let native = self.arity();
        let component_size = self.component_type.size();

        if let Some(bytes) = base {
            let stride = self.stride();
            for (i, element) in out.chunks_exact_mut(arity).enumerate() {
                let src = &bytes[i * stride..];
                for (c, slot) in element.iter_mut().take(native).enumerate() {
                    *slot = self
                        .component_type
                        .read_f32(&src[c * component_size..], self.normalized);
                }
            }
        }

        if let Some((targets, values)) = substitutions {
            for (k, target) in targets.into_iter().enumerate() {
                let element = &mut out[target * arity..(target + 1) * arity];
                let src = &values[k * self.element_size()..];
                for (c, slot) in element.iter_mut().take(native).enumerate() {
                    *slot = self
                        .component_type
                        .read_f32(&src[c * component_size..], self.normalized);
                }
            }
        }

        Ok(out)
    }

    /// Decode index `i`, widened to `u32`.
    ///
    /// Sparse substitution is not consulted; use [`AccessorDesc::read_indices`] for that.
    pub fn read_index(&self, buffers: &[Vec<u8>], i: usize) -> Result<u32, DecodeError> {
        self.check_index_layout()?;
        if i >= self.count {
            return Err(DecodeError::ElementOutOfRange {
                accessor: self.index,
                element: i,
                count: self.count,
            });
        }
        let Some(view) = &self.view else {
            return Ok(0);
        };
        let size = self.component_type.size();
        let offset = self.byte_offset + i * self.stride();
        let bytes = view.slice(self.index, buffers, offset, size)?;
        Ok(self.component_type.read_u32(bytes))
    }

    /// Decode every index, widened to `u32`, with sparse substitution applied.
    pub fn read_indices(&self, buffers: &[Vec<u8>]) -> Result<Vec<u32>, DecodeError> {
        self.check_index_layout()?;
        let base = self.element_bytes(buffers)?;
        let size = self.component_type.size();
        let substitutions = match &self.sparse {
            Some(sparse) => Some((
                self.sparse_indices(sparse, buffers)?,
                sparse.values.slice(
                    self.index,
                    buffers,
                    sparse.values_offset,
                    sparse.count.saturating_mul(size),
                )?,
            )),
            None => None,
        };

        let mut out = match base {
            Some(bytes) => {
                let stride = self.stride();
                (0..self.count)
                    .map(|i| self.component_type.read_u32(&bytes[i * stride..]))
                    .collect()
            }
            None => self.zeroed(1, 0)?,
        };

        if let Some((targets, values)) = substitutions {
            for (k, target) in targets.into_iter().enumerate() {
                out[target] = self.component_type.read_u32(&values[k * size..]);
            }
        }

        Ok(out)
    }

    /// `count * arity` copies of `zero`, or `TooLarge` when that cannot be allocated.
    fn zeroed<T: Clone>(&self, arity: usize, zero: T) -> Result<Vec<T>, DecodeError> {
        let too_large = || DecodeError::TooLarge {
            accessor: self.index,
            count: self.count,
        };
        let len = self.count.checked_mul(arity).ok_or_else(too_large)?;
        let mut out = Vec::new();
        out.try_reserve_exact(len).map_err(|_| too_large())?;
        out.resize(len, zero);
        Ok(out)
    }

    fn check_index_layout(&self) -> Result<(), DecodeError> {
        if !self.component_type.is_index() {
            return Err(DecodeError::UnsupportedComponentType {
                accessor: self.index,
                component: self.component_type,
                usage: "indices",
            });
        }
        if self.element_type != ElementType::Scalar {
            return Err(DecodeError::UnsupportedElementType {
                accessor: self.index,
                element: self.element_type,
                usage: "indices",
            });
        }
        Ok(())
    }

    /// Element positions targeted by a sparse block, validated against `count`.
    fn sparse_indices(
        &self,
        sparse: &SparseDesc,
        buffers: &[Vec<u8>],
    ) -> Result<Vec<usize>, DecodeError> {
        if !sparse.index_type.is_index() {
            return Err(DecodeError::UnsupportedComponentType {
                accessor: self.index,
                component: sparse.index_type,
                usage: "sparse indices",
            });
        }
        let size = sparse.index_type.size();
        let bytes = sparse.indices.slice(
            self.index,
            buffers,
            sparse.indices_offset,
            sparse.count.saturating_mul(size),
        )?;
        bytes
            .chunks_exact(size)
            .map(|b| {
                let target = sparse.index_type.read_u32(b) as usize;
                if target < self.count {
                    Ok(target)
                } else {
                    Err(DecodeError::ElementOutOfRange {
                        accessor: self.index,
                        element: target,
                        count: self.count,
                    })
                }
            })
            .collect()
    }
}
