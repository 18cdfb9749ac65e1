//! Builds a tiny, valid, synthetic SFNT font in memory so the integration
//! tests don't need a real font file on disk — only `.notdef` plus
//! contourless glyphs for the printable ASCII range, enough to exercise
//! cmap lookup, hmtx advances and the shaping pipeline's buffer plumbing
//! without depending on any GSUB/GPOS table.

const UNITS_PER_EM: u16 = 1000;
const FIRST_CODEPOINT: u32 = 0x20;
const LAST_CODEPOINT: u32 = 0x7E;

fn be16(v: u16) -> [u8; 2] {
    v.to_be_bytes()
}

fn be32(v: u32) -> [u8; 4] {
    v.to_be_bytes()
}

/// `.notdef` at glyph 0, then one contourless glyph per printable ASCII
/// codepoint in order, each advancing by `advance` font units.
pub fn build_ascii_font(advance: u16) -> Vec<u8> {
    let num_glyphs: u16 = (LAST_CODEPOINT - FIRST_CODEPOINT + 1) as u16 + 1;

    let tables: Vec<(&[u8; 4], Vec<u8>)> = vec![
        (b"cmap", build_cmap()),
        (b"glyf", Vec::new()),
        (b"head", build_head()),
        (b"hhea", build_hhea(advance, num_glyphs)),
        (b"hmtx", build_hmtx(advance, num_glyphs)),
        (b"loca", build_loca(num_glyphs)),
        (b"maxp", build_maxp(num_glyphs)),
    ];

    build_sfnt(tables)
}

/// The glyph id `build_ascii_font` maps `c` to, matching its single cmap group.
pub fn glyph_for(c: char) -> u16 {
    (c as u32 - FIRST_CODEPOINT + 1) as u16
}

fn build_sfnt(tables: Vec<(&[u8; 4], Vec<u8>)>) -> Vec<u8> {
    let num_tables = tables.len() as u16;
    let mut entry_selector = 0u16;
    while (1u16 << (entry_selector + 1)) <= num_tables {
        entry_selector += 1;
    }
    let search_range = (1u16 << entry_selector) * 16;
    let range_shift = num_tables * 16 - search_range;

    let mut out = Vec::new();
    out.extend_from_slice(&be32(0x0001_0000));
    out.extend_from_slice(&be16(num_tables));
    out.extend_from_slice(&be16(search_range));
    out.extend_from_slice(&be16(entry_selector));
    out.extend_from_slice(&be16(range_shift));

    let header_len = 12 + 16 * tables.len();
    let mut offset = header_len;
    let mut data = Vec::new();
    let mut directory = Vec::new();
    for (tag, bytes) in &tables {
        let padded_len = (bytes.len() + 3) / 4 * 4;
        directory.push((*tag, bytes.len() as u32, offset as u32));
        data.extend_from_slice(bytes);
        data.resize(data.len() + (padded_len - bytes.len()), 0);
        offset += padded_len;
    }

    for (tag, len, off) in &directory {
        out.extend_from_slice(*tag);
        out.extend_from_slice(&be32(0)); // checksum: unvalidated by the parser
        out.extend_from_slice(&be32(*off));
        out.extend_from_slice(&be32(*len));
    }
    out.extend_from_slice(&data);
    out
}

fn build_head() -> Vec<u8> {
    let mut v = Vec::new();
    v.extend_from_slice(&be16(1)); // majorVersion
    v.extend_from_slice(&be16(0)); // minorVersion
    v.extend_from_slice(&be32(0x0001_0000)); // fontRevision
    v.extend_from_slice(&be32(0)); // checkSumAdjustment
    v.extend_from_slice(&be32(0x5F0F_3CF5)); // magicNumber
    v.extend_from_slice(&be16(0)); // flags
    v.extend_from_slice(&be16(UNITS_PER_EM));
    v.extend_from_slice(&[0; 8]); // created
    v.extend_from_slice(&[0; 8]); // modified
    v.extend_from_slice(&be16(0)); // xMin
    v.extend_from_slice(&be16(0)); // yMin
    v.extend_from_slice(&be16(0)); // xMax
    v.extend_from_slice(&be16(0)); // yMax
    v.extend_from_slice(&be16(0)); // macStyle
    v.extend_from_slice(&be16(8)); // lowestRecPPEM
    v.extend_from_slice(&be16(2)); // fontDirectionHint
    v.extend_from_slice(&be16(0)); // indexToLocFormat: short
    v.extend_from_slice(&be16(0)); // glyphDataFormat
    v
}

fn build_hhea(advance: u16, num_glyphs: u16) -> Vec<u8> {
    let mut v = Vec::new();
    v.extend_from_slice(&be16(1));
    v.extend_from_slice(&be16(0));
    v.extend_from_slice(&(800i16).to_be_bytes()); // ascender
    v.extend_from_slice(&(-200i16).to_be_bytes()); // descender
    v.extend_from_slice(&be16(0)); // lineGap
    v.extend_from_slice(&be16(advance)); // advanceWidthMax
    v.extend_from_slice(&be16(0)); // minLeftSideBearing
    v.extend_from_slice(&be16(0)); // minRightSideBearing
    v.extend_from_slice(&be16(advance)); // xMaxExtent
    v.extend_from_slice(&be16(1)); // caretSlopeRise
    v.extend_from_slice(&be16(0)); // caretSlopeRun
    v.extend_from_slice(&be16(0)); // caretOffset
    v.extend_from_slice(&[0; 8]); // reserved x4
    v.extend_from_slice(&be16(0)); // metricDataFormat
    v.extend_from_slice(&be16(num_glyphs)); // numberOfHMetrics
    v
}

fn build_maxp(num_glyphs: u16) -> Vec<u8> {
    let mut v = Vec::new();
    v.extend_from_slice(&be32(0x0001_0000));
    v.extend_from_slice(&be16(num_glyphs));
    v.extend_from_slice(&[0; 2 * 13]); // remaining limits, all zero
    v
}

fn build_hmtx(advance: u16, num_glyphs: u16) -> Vec<u8> {
    let mut v = Vec::new();
    for _ in 0..num_glyphs {
        v.extend_from_slice(&be16(advance));
        v.extend_from_slice(&be16(0)); // lsb
    }
    v
}

fn build_loca(num_glyphs: u16) -> Vec<u8> {
    let mut v = Vec::new();
    for _ in 0..=num_glyphs {
        v.extend_from_slice(&be16(0)); // every glyph is empty: offset 0, length 0
    }
    v
}

fn build_cmap() -> Vec<u8> {
    let num_groups: u32 = 1;
    let subtable_len: u32 = 16 + num_groups * 12;

    let mut subtable = Vec::new();
    subtable.extend_from_slice(&be16(12)); // format
    subtable.extend_from_slice(&be16(0)); // reserved
    subtable.extend_from_slice(&be32(subtable_len));
    subtable.extend_from_slice(&be32(0)); // language
    subtable.extend_from_slice(&be32(num_groups));
    subtable.extend_from_slice(&be32(FIRST_CODEPOINT));
    subtable.extend_from_slice(&be32(LAST_CODEPOINT));
    subtable.extend_from_slice(&be32(1)); // startGlyphID (0 is .notdef)

    let mut v = Vec::new();
    v.extend_from_slice(&be16(0)); // version
    v.extend_from_slice(&be16(1)); // numTables
    v.extend_from_slice(&be16(3)); // platformID: Windows
    v.extend_from_slice(&be16(10)); // encodingID: UCS-4
    v.extend_from_slice(&be32(16)); // offset to subtable
    v.extend_from_slice(&subtable);
    v
}
