use crate::buffer::{ByteCursor, Endianness, Method};
use crate::error::{Error, Result};

/// ZIP compression methods
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionMethod {
    Stored,
    Deflate,
    Unknown(u16),
}

impl CompressionMethod {
    pub fn from_u16(value: u16) -> Self {
        match value {
            0 => CompressionMethod::Stored,
            8 => CompressionMethod::Deflate,
            _ => CompressionMethod::Unknown(value),
        }
    }

    pub fn as_u16(&self) -> u16 {
        match self {
            CompressionMethod::Stored => 0,
            CompressionMethod::Deflate => 8,
            CompressionMethod::Unknown(v) => *v,
        }
    }

    /// The stream codec for this method, if it is one we can decode.
    pub fn method(&self) -> Option<Method> {
        match self {
            CompressionMethod::Stored => Some(Method::Store),
            CompressionMethod::Deflate => Some(Method::Deflate),
            CompressionMethod::Unknown(_) => None,
        }
    }
}

/// General purpose bit flag: 16 independent bits.
///
/// Only bit 0 (encrypted), bit 3 (CRC and sizes follow the data in a
/// descriptor) and bit 11 (UTF-8 names) mean anything to this crate; the
/// others are carried through untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GeneralPurposeFlags(u16);

impl GeneralPurposeFlags {
    const ENCRYPTED: u8 = 0;
    const DATA_DESCRIPTOR: u8 = 3;
    const UTF8_NAMES: u8 = 11;

    pub fn from_bits(bits: u16) -> Self {
        Self(bits)
    }

    pub fn bits(&self) -> u16 {
        self.0
    }

    /// Flags written for every entry this crate encodes.
    pub fn utf8() -> Self {
        Self::default().with(Self::UTF8_NAMES, true)
    }

    pub fn get(&self, bit: u8) -> bool {
        bit < 16 && self.0 & (1 << bit) != 0
    }

    pub fn with(self, bit: u8, value: bool) -> Self {
        if bit >= 16 {
            return self;
        }
        if value {
            Self(self.0 | (1 << bit))
        } else {
            Self(self.0 & !(1 << bit))
        }
    }

    pub fn encrypted(&self) -> bool {
        self.get(Self::ENCRYPTED)
    }

    pub fn has_data_descriptor(&self) -> bool {
        self.get(Self::DATA_DESCRIPTOR)
    }

    pub fn utf8_names(&self) -> bool {
        self.get(Self::UTF8_NAMES)
    }
}

/// End of Central Directory (EOCD) - 22 bytes minimum
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndOfCentralDirectory {
    pub disk_number: u16,
    pub disk_with_cd: u16,
    pub disk_entries: u16,
    pub total_entries: u16,
    pub cd_size: u32,
    pub cd_offset: u32,
    pub comment: Vec<u8>,
}

impl EndOfCentralDirectory {
    pub const SIGNATURE: u32 = 0x06054b50;
    pub const SIZE: usize = 22;

    /// Parse the record body. The caller has already consumed the signature.
    ///
    /// Fails if the comment runs past the end of the buffer.
    pub fn parse(buffer: &mut ByteCursor) -> Result<Self> {
        let disk_number = buffer.read()?;
        let disk_with_cd = buffer.read()?;
        let disk_entries = buffer.read()?;
        let total_entries = buffer.read()?;
        let cd_size = buffer.read()?;
        let cd_offset = buffer.read()?;
        let comment_len = buffer.read::<u16>()? as usize;
        let comment = buffer.sub_buffer(comment_len)?.into_inner();

        Ok(Self {
            disk_number,
            disk_with_cd,
            disk_entries,
            total_entries,
            cd_size,
            cd_offset,
            comment,
        })
    }

    pub fn write(&self) -> Result<ByteCursor> {
        let comment_len = u16::try_from(self.comment.len())
            .map_err(|_| Error::overflow("comment", "archive", self.comment.len()))?;
        let mut buffer =
            ByteCursor::allocate_with(Self::SIZE + self.comment.len(), Endianness::Little);
        buffer.write(Self::SIGNATURE)?;
        buffer.write(self.disk_number)?;
        buffer.write(self.disk_with_cd)?;
        buffer.write(self.disk_entries)?;
        buffer.write(self.total_entries)?;
        buffer.write(self.cd_size)?;
        buffer.write(self.cd_offset)?;
        buffer.write(comment_len)?;
        buffer.write_bytes(&self.comment)?;
        Ok(buffer)
    }
}

/// Central Directory File Header (CDFH) - 46 bytes minimum
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CentralDirectoryHeader {
    pub version_made_by: u16,
    pub version_needed: u16,
    pub flags: GeneralPurposeFlags,
    pub compression_method: CompressionMethod,
    pub last_mod_time: u16,
    pub last_mod_date: u16,
    pub crc32: u32,
    pub compressed_size: u32,
    pub uncompressed_size: u32,
    pub disk_number_start: u16,
    pub internal_attrs: u16,
    pub external_attrs: u32,
    pub lfh_offset: u32,
    pub file_name: String,
    pub extra_field: Vec<u8>,
    pub comment: Vec<u8>,
    /// Set when a trailing `/` was stripped from a name with data, which
    /// makes the record lose against a real file of the same name.
    pub looks_like_directory: bool,
}

impl CentralDirectoryHeader {
    pub const SIGNATURE: u32 = 0x02014b50;
    pub const MIN_SIZE: usize = 46;

    pub fn parse(buffer: &mut ByteCursor) -> Result<Self> {
        let offset = buffer.position();
        if buffer.read::<u32>()? != Self::SIGNATURE {
            return Err(Error::InvalidSignature {
                record: "central directory header",
                offset,
            });
        }

        let version_made_by = buffer.read()?;
        let version_needed = buffer.read()?;
        let flags = GeneralPurposeFlags::from_bits(buffer.read()?);
        let compression_method = CompressionMethod::from_u16(buffer.read()?);
        let last_mod_time = buffer.read()?;
        let last_mod_date = buffer.read()?;
        let crc32 = buffer.read()?;
        let compressed_size = buffer.read::<u32>()?;
        let uncompressed_size = buffer.read()?;
        let file_name_length = buffer.read::<u16>()? as usize;
        let extra_field_length = buffer.read::<u16>()? as usize;
        let file_comment_length = buffer.read::<u16>()? as usize;
        let disk_number_start = buffer.read()?;
        let internal_attrs = buffer.read()?;
        let external_attrs = buffer.read()?;
        let lfh_offset = buffer.read()?;

        let mut file_name = buffer.sub_buffer(file_name_length)?.to_string_lossy();
        let looks_like_directory = file_name.ends_with('/') && compressed_size != 0;
        if looks_like_directory {
            file_name.pop();
        }
        let extra_field = buffer.sub_buffer(extra_field_length)?.into_inner();
        let comment = buffer.sub_buffer(file_comment_length)?.into_inner();

        Ok(Self {
            version_made_by,
            version_needed,
            flags,
            compression_method,
            last_mod_time,
            last_mod_date,
            crc32,
            compressed_size,
            uncompressed_size,
            disk_number_start,
            internal_attrs,
            external_attrs,
            lfh_offset,
            file_name,
            extra_field,
            comment,
            looks_like_directory,
        })
    }

    pub fn write(&self) -> Result<ByteCursor> {
        let name = self.file_name.as_bytes();
        let name_len = field_len("file name", &self.file_name, name.len())?;
        let extra_len = field_len("extra field", &self.file_name, self.extra_field.len())?;
        let comment_len = field_len("comment", &self.file_name, self.comment.len())?;

        let mut buffer = ByteCursor::allocate_with(
            Self::MIN_SIZE + name.len() + self.extra_field.len() + self.comment.len(),
            Endianness::Little,
        );
        buffer.write(Self::SIGNATURE)?;
        buffer.write(self.version_made_by)?;
        buffer.write(self.version_needed)?;
        buffer.write(self.flags.bits())?;
        buffer.write(self.compression_method.as_u16())?;
        buffer.write(self.last_mod_time)?;
        buffer.write(self.last_mod_date)?;
        buffer.write(self.crc32)?;
        buffer.write(self.compressed_size)?;
        buffer.write(self.uncompressed_size)?;
        buffer.write(name_len)?;
        buffer.write(extra_len)?;
        buffer.write(comment_len)?;
        buffer.write(self.disk_number_start)?;
        buffer.write(self.internal_attrs)?;
        buffer.write(self.external_attrs)?;
        buffer.write(self.lfh_offset)?;
        buffer.write_bytes(name)?;
        buffer.write_bytes(&self.extra_field)?;
        buffer.write_bytes(&self.comment)?;
        Ok(buffer)
    }
}

/// Local File Header (LFH) - 30 bytes minimum
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalFileHeader {
    pub version_needed: u16,
    pub flags: GeneralPurposeFlags,
    pub compression_method: CompressionMethod,
    pub last_mod_time: u16,
    pub last_mod_date: u16,
    pub crc32: u32,
    pub compressed_size: u32,
    pub uncompressed_size: u32,
    pub file_name: String,
    pub extra_field: Vec<u8>,
}

impl LocalFileHeader {
    pub const SIGNATURE: u32 = 0x04034b50;
    pub const MIN_SIZE: usize = 30;

    /// Parse a header, leaving the buffer positioned at the entry's data.
    pub fn parse(buffer: &mut ByteCursor) -> Result<Self> {
        let offset = buffer.position();
        if buffer.read::<u32>()? != Self::SIGNATURE {
            return Err(Error::InvalidSignature {
                record: "local file header",
                offset,
            });
        }

        let version_needed = buffer.read()?;
        let flags = GeneralPurposeFlags::from_bits(buffer.read()?);
        let compression_method = CompressionMethod::from_u16(buffer.read()?);
        let last_mod_time = buffer.read()?;
        let last_mod_date = buffer.read()?;
        let crc32 = buffer.read()?;
        let compressed_size = buffer.read()?;
        let uncompressed_size = buffer.read()?;
        let file_name_length = buffer.read::<u16>()? as usize;
        let extra_field_length = buffer.read::<u16>()? as usize;
        let file_name = buffer.sub_buffer(file_name_length)?.to_string_lossy();
        let extra_field = buffer.sub_buffer(extra_field_length)?.into_inner();

        Ok(Self {
            version_needed,
            flags,
            compression_method,
            last_mod_time,
            last_mod_date,
            crc32,
            compressed_size,
            uncompressed_size,
            file_name,
            extra_field,
        })
    }

    pub fn write(&self) -> Result<ByteCursor> {
        let name = self.file_name.as_bytes();
        let name_len = field_len("file name", &self.file_name, name.len())?;
        let extra_len = field_len("extra field", &self.file_name, self.extra_field.len())?;

        let mut buffer = ByteCursor::allocate_with(
            Self::MIN_SIZE + name.len() + self.extra_field.len(),
            Endianness::Little,
        );
        buffer.write(Self::SIGNATURE)?;
        buffer.write(self.version_needed)?;
        buffer.write(self.flags.bits())?;
        buffer.write(self.compression_method.as_u16())?;
        buffer.write(self.last_mod_time)?;
        buffer.write(self.last_mod_date)?;
        buffer.write(self.crc32)?;
        buffer.write(self.compressed_size)?;
        buffer.write(self.uncompressed_size)?;
        buffer.write(name_len)?;
        buffer.write(extra_len)?;
        buffer.write_bytes(name)?;
        buffer.write_bytes(&self.extra_field)?;
        Ok(buffer)
    }
}

fn field_len(field: &'static str, name: &str, len: usize) -> Result<u16> {
    u16::try_from(len).map_err(|_| Error::overflow(field, name, len))
}
