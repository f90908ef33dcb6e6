//! Built-in metadata dialects and their field rules.

use std::fmt;

use super::reader::MetadataReader;
use crate::error::Result;

/// Granularity of the DIF reader registered for the `dif` format.
///
/// Both variants read the same records; a deployment picks one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DifVariant {
    /// Dublin-Core-like field names (`title`, `creator`, `source`, ...).
    Coarse,
    /// One field per DIF element (`Entry-title`, `Related_URL/URL`, ...).
    #[default]
    Fine,
}

/// A known metadata dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    DublinCore,
    Ddi,
    Dif(DifVariant),
}

impl Dialect {
    /// The OAI-PMH metadata prefix this dialect is registered under.
    #[must_use]
    pub fn format_id(&self) -> &'static str {
        match self {
            Self::DublinCore => "oai_dc",
            Self::Ddi => "oai_ddi",
            Self::Dif(_) => "dif",
        }
    }

    /// Build the reader for this dialect.
    pub fn reader(&self) -> Result<MetadataReader> {
        match self {
            Self::DublinCore => MetadataReader::new(DC_FIELDS.iter().copied(), DC_NAMESPACES),
            Self::Ddi => MetadataReader::new(DDI_FIELDS.iter().copied(), DDI_NAMESPACES),
            Self::Dif(DifVariant::Coarse) => {
                MetadataReader::new(DIF_COARSE_FIELDS.iter().copied(), DIF_NAMESPACES)
            }
            Self::Dif(DifVariant::Fine) => {
                MetadataReader::new(DIF_FINE_FIELDS.iter().copied(), DIF_NAMESPACES)
            }
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DublinCore => f.write_str("Dublin Core"),
            Self::Ddi => f.write_str("DDI"),
            Self::Dif(DifVariant::Coarse) => f.write_str("DIF (coarse)"),
            Self::Dif(DifVariant::Fine) => f.write_str("DIF (fine)"),
        }
    }
}

const DC_NAMESPACES: [(&str, &str); 3] = [
    ("oai_dc", "http://www.openarchives.org/OAI/2.0/oai_dc/"),
    ("oai", "http://www.openarchives.org/OAI/2.0/"),
    ("dc", "http://purl.org/dc/elements/1.1/"),
];

// maintainer_email is not part of Dublin Core; some repositories add it in
// the OAI namespace.
const DC_FIELDS: &[(&str, &str, &str)] = &[
    ("title", "textList", "oai_dc:dc/dc:title/text()"),
    ("creator", "textList", "oai_dc:dc/dc:creator/text()"),
    ("subject", "textList", "oai_dc:dc/dc:subject/text()"),
    ("description", "textList", "oai_dc:dc/dc:description/text()"),
    ("publisher", "textList", "oai_dc:dc/dc:publisher/text()"),
    ("maintainer_email", "textList", "oai_dc:dc/oai:maintainer_email/text()"),
    ("contributor", "textList", "oai_dc:dc/dc:contributor/text()"),
    ("date", "textList", "oai_dc:dc/dc:date/text()"),
    ("type", "textList", "oai_dc:dc/dc:type/text()"),
    ("format", "textList", "oai_dc:dc/dc:format/text()"),
    ("identifier", "textList", "oai_dc:dc/dc:identifier/text()"),
    ("source", "textList", "oai_dc:dc/dc:source/text()"),
    ("language", "textList", "oai_dc:dc/dc:language/text()"),
    ("relation", "textList", "oai_dc:dc/dc:relation/text()"),
    ("coverage", "textList", "oai_dc:dc/dc:coverage/text()"),
    ("rights", "textList", "oai_dc:dc/dc:rights/text()"),
];

const DDI_NAMESPACES: [(&str, &str); 1] = [("ddi", "http://www.icpsr.umich.edu/DDI")];

const DDI_FIELDS: &[(&str, &str, &str)] = &[
    ("title", "textList", "ddi:codeBook/ddi:stdyDscr/ddi:citation/ddi:titlStmt/ddi:titl/text()"),
    ("creator", "textList", "ddi:codeBook/ddi:stdyDscr/ddi:citation/ddi:rspStmt/ddi:AuthEnty/text()"),
    ("subject", "textList", "ddi:codeBook/ddi:stdyDscr/ddi:stdyInfo/ddi:subject/ddi:keyword/text()"),
    ("description", "textList", "ddi:codeBook/ddi:stdyDscr/ddi:stdyInfo/ddi:abstract/text()"),
    ("publisher", "textList", "ddi:codeBook/ddi:stdyDscr/ddi:citation/ddi:distStmt/ddi:contact/text()"),
    ("contributor", "textList", "ddi:codeBook/ddi:stdyDscr/ddi:citation/ddi:contributor/text()"),
    ("date", "textList", "ddi:codeBook/ddi:stdyDscr/ddi:citation/ddi:prodStmt/ddi:prodDate/text()"),
    ("series", "textList", "ddi:codeBook/ddi:stdyDscr/ddi:citation/ddi:serStmt/ddi:serName/text()"),
    ("type", "textList", "ddi:codeBook/ddi:stdyDscr/ddi:stdyInfo/ddi:sumDscr/ddi:dataKind/text()"),
    ("format", "textList", "ddi:codeBook/ddi:fileDscr/ddi:fileType/text()"),
    ("identifier", "textList", "ddi:codeBook/ddi:stdyDscr/ddi:citation/ddi:titlStmt/ddi:IDNo/text()"),
    ("source", "textList", "ddi:codeBook/ddi:stdyDscr/ddi:dataAccs/ddi:setAvail/ddi:accsPlac/@URI"),
    ("language", "textList", "ddi:codeBook/@xml:lang"),
    ("tempCoverage", "textList", "ddi:codeBook/ddi:stdyDscr/ddi:stdyInfo/ddi:sumDscr/ddi:timePrd/text()"),
    ("geoCoverage", "textList", "ddi:codeBook/ddi:stdyDscr/ddi:stdyInfo/ddi:sumDscr/ddi:geogCover/text()"),
    ("rights", "textList", "ddi:codeBook/ddi:stdyDscr/ddi:citation/ddi:prodStmt/ddi:copyright/text()"),
];

const DIF_NAMESPACES: [(&str, &str); 1] = [("dif", "http://gcmd.gsfc.nasa.gov/Aboutus/xml/dif/")];

// DIF is matched by local name so that both default-namespaced and prefixed
// records are read.
macro_rules! dif {
    ($path:literal) => {
        concat!(
            "//*[local-name()='metadata']/*[local-name()='DIF']/",
            $path
        )
    };
}

const DIF_COARSE_FIELDS: &[(&str, &str, &str)] = &[
    ("title", "textList", dif!("*[local-name()='Entry_Title']/text()")),
    ("creator", "textList", dif!("*[local-name()='Data_Set_Citation']/*[local-name()='Dataset_Creator']/text()")),
    ("subject", "textList", dif!("*[local-name()='Keyword']/text()")),
    ("description", "textList", dif!("*[local-name()='Summary']/*[local-name()='Abstract']/text()")),
    ("publisher", "textList", dif!("*[local-name()='Data_Set_Citation']/*[local-name()='Dataset_Publisher']/text()")),
    ("maintainer_email", "textList", dif!("*[local-name()='Personnel']/*[local-name()='Email']/text()")),
    ("contributor", "textList", dif!("*[local-name()='Personnel']/*[local-name()='Last_Name']/text()")),
    ("date", "textList", dif!("*[local-name()='Data_Set_Citation']/*[local-name()='Dataset_Release_Date']/text()")),
    ("identifier", "textList", dif!("*[local-name()='Entry_ID']/text()")),
    ("source", "textList", dif!("*[local-name()='Related_URL']/*[local-name()='URL']/text()")),
    ("language", "textList", dif!("*[local-name()='Data_Set_Language']/text()")),
    ("coverage", "textList", dif!("*[local-name()='Location']/*[local-name()='Location_Type']/text()")),
    ("rights", "textList", dif!("*[local-name()='Access_Constraints']/text()")),
];

const DIF_FINE_FIELDS: &[(&str, &str, &str)] = &[
    ("Entry-ID", "textList", dif!("*[local-name()='Entry_ID']/text()")),
    ("Entry-title", "textList", dif!("*[local-name()='Entry_Title']/text()")),
    ("Creator", "textList", dif!("*[local-name()='Data_Set_Citation']/*[local-name()='Dataset_Creator']/text()")),
    ("Publisher", "textList", dif!("*[local-name()='Data_Set_Citation']/*[local-name()='Dataset_Publisher']/text()")),
    ("Release-date", "textList", dif!("*[local-name()='Data_Set_Citation']/*[local-name()='Dataset_Release_Date']/text()")),
    ("Version", "textList", dif!("*[local-name()='Data_Set_Citation']/*[local-name()='Version']/text()")),
    ("Personnel/Role", "textList", dif!("*[local-name()='Personnel']/*[local-name()='Role']/text()")),
    ("Personnel/First-name", "textList", dif!("*[local-name()='Personnel']/*[local-name()='First_Name']/text()")),
    ("Personnel/Last-name", "textList", dif!("*[local-name()='Personnel']/*[local-name()='Last_Name']/text()")),
    ("Personnel/Email", "textList", dif!("*[local-name()='Personnel']/*[local-name()='Email']/text()")),
    ("Parameters/Topic", "textList", dif!("*[local-name()='Parameters']/*[local-name()='Topic']/text()")),
    ("Parameters/Term", "textList", dif!("*[local-name()='Parameters']/*[local-name()='Term']/text()")),
    ("ISO-topic-category", "textList", dif!("*[local-name()='ISO_Topic_Category']/text()")),
    ("Keyword", "textList", dif!("*[local-name()='Keyword']/text()")),
    ("Temporal-coverage/Start-date", "textList", dif!("*[local-name()='Temporal_Coverage']/*[local-name()='Start_Date']/text()")),
    ("Temporal-coverage/Stop-date", "textList", dif!("*[local-name()='Temporal_Coverage']/*[local-name()='Stop_Date']/text()")),
    ("Spatial-coverage/Southernmost-latitude", "textList", dif!("*[local-name()='Spatial_Coverage']/*[local-name()='Southernmost_Latitude']/text()")),
    ("Spatial-coverage/Northernmost-latitude", "textList", dif!("*[local-name()='Spatial_Coverage']/*[local-name()='Northernmost_Latitude']/text()")),
    ("Spatial-coverage/Westernmost-longitude", "textList", dif!("*[local-name()='Spatial_Coverage']/*[local-name()='Westernmost_Longitude']/text()")),
    ("Spatial-coverage/Easternmost-longitude", "textList", dif!("*[local-name()='Spatial_Coverage']/*[local-name()='Easternmost_Longitude']/text()")),
    ("Location/Category", "textList", dif!("*[local-name()='Location']/*[local-name()='Location_Category']/text()")),
    ("Location/Type", "textList", dif!("*[local-name()='Location']/*[local-name()='Location_Type']/text()")),
    ("Project/Short-name", "textList", dif!("*[local-name()='Project']/*[local-name()='Short_Name']/text()")),
    ("Access-constraints", "textList", dif!("*[local-name()='Access_Constraints']/text()")),
    ("Use-constraints", "textList", dif!("*[local-name()='Use_Constraints']/text()")),
    ("Data-set-language", "textList", dif!("*[local-name()='Data_Set_Language']/text()")),
    ("Data-center/Name", "textList", dif!("*[local-name()='Data_Center']/*[local-name()='Data_Center_Name']/*[local-name()='Short_Name']/text()")),
    ("Summary/Abstract", "textList", dif!("*[local-name()='Summary']/*[local-name()='Abstract']/text()")),
    ("Related_URL/Type", "textList", dif!("*[local-name()='Related_URL']/*[local-name()='URL_Content_Type']/*[local-name()='Type']/text()")),
    ("Related_URL/URL", "textList", dif!("*[local-name()='Related_URL']/*[local-name()='URL']/text()")),
    ("Related_URL/Description", "textList", dif!("*[local-name()='Related_URL']/*[local-name()='Description']/text()")),
    ("Metadata-name", "textList", dif!("*[local-name()='Metadata_Name']/text()")),
    ("Metadata-version", "textList", dif!("*[local-name()='Metadata_Version']/text()")),
];

#[cfg(test)]
mod tests {
    use super::*;
    use roxmltree::Document;

    #[test]
    fn test_all_builtin_readers_compile() {
        for dialect in [
            Dialect::DublinCore,
            Dialect::Ddi,
            Dialect::Dif(DifVariant::Coarse),
            Dialect::Dif(DifVariant::Fine),
        ] {
            let reader = dialect.reader();
            assert!(reader.is_ok(), "{dialect} failed: {:?}", reader.err());
        }
    }

    #[test]
    fn test_dif_variants_share_format_id() {
        assert_eq!(Dialect::Dif(DifVariant::Coarse).format_id(), "dif");
        assert_eq!(Dialect::Dif(DifVariant::Fine).format_id(), "dif");
    }

    #[test]
    fn test_dublin_core_extraction() {
        let xml = r#"<metadata xmlns="http://www.openarchives.org/OAI/2.0/">
  <oai_dc:dc xmlns:oai_dc="http://www.openarchives.org/OAI/2.0/oai_dc/"
             xmlns:dc="http://purl.org/dc/elements/1.1/">
    <dc:title>Sea ice</dc:title>
    <dc:creator>Jane Doe</dc:creator>
    <maintainer_email>data@example.org</maintainer_email>
  </oai_dc:dc>
</metadata>"#;
        let doc = Document::parse(xml).unwrap();
        let fields = Dialect::DublinCore
            .reader()
            .unwrap()
            .extract(doc.root_element());
        assert_eq!(fields.first("title"), Some("Sea ice"));
        assert_eq!(fields.first("creator"), Some("Jane Doe"));
        assert_eq!(fields.first("maintainer_email"), Some("data@example.org"));
        assert!(fields.values("subject").is_empty());
    }

    #[test]
    fn test_ddi_extraction() {
        let xml = r#"<metadata><codeBook xmlns="http://www.icpsr.umich.edu/DDI" xml:lang="no">
  <stdyDscr>
    <citation>
      <titlStmt><titl>Election survey</titl></titlStmt>
      <rspStmt><AuthEnty>Statistics Norway</AuthEnty></rspStmt>
      <serStmt><serName>Elections</serName></serStmt>
    </citation>
    <dataAccs><setAvail><accsPlac URI="http://example.org/study/1"/></setAvail></dataAccs>
  </stdyDscr>
</codeBook></metadata>"#;
        let doc = Document::parse(xml).unwrap();
        let fields = Dialect::Ddi.reader().unwrap().extract(doc.root_element());
        assert_eq!(fields.first("title"), Some("Election survey"));
        assert_eq!(fields.first("creator"), Some("Statistics Norway"));
        assert_eq!(fields.first("series"), Some("Elections"));
        assert_eq!(fields.first("source"), Some("http://example.org/study/1"));
        assert_eq!(fields.first("language"), Some("no"));
    }

    #[test]
    fn test_dif_fine_extraction() {
        let xml = r#"<OAI-PMH xmlns="http://www.openarchives.org/OAI/2.0/"><GetRecord><record><metadata>
  <DIF xmlns="http://gcmd.gsfc.nasa.gov/Aboutus/xml/dif/">
    <Entry_ID>met.no-1</Entry_ID>
    <Entry_Title>Sea surface temperature</Entry_Title>
    <Related_URL><URL>http://thredds.met.no/wms?service=WMS</URL><Description>WMS</Description></Related_URL>
    <Related_URL><URL>http://thredds.met.no/catalog.html</URL><Description>Catalog</Description></Related_URL>
    <Use_Constraints>Not available</Use_Constraints>
    <Access_Constraints>CC-BY</Access_Constraints>
  </DIF>
</metadata></record></GetRecord></OAI-PMH>"#;
        let doc = Document::parse(xml).unwrap();
        let metadata = doc
            .descendants()
            .find(|n| n.has_tag_name(("http://www.openarchives.org/OAI/2.0/", "metadata")))
            .unwrap();
        let fields = Dialect::Dif(DifVariant::Fine)
            .reader()
            .unwrap()
            .extract(metadata);
        assert_eq!(fields.first("Entry-title"), Some("Sea surface temperature"));
        assert_eq!(fields.values("Related_URL/URL").len(), 2);
        assert_eq!(
            fields.values("Related_URL/Description"),
            ["WMS".to_string(), "Catalog".to_string()]
        );
        assert_eq!(fields.first("Access-constraints"), Some("CC-BY"));
    }
}
