//! Test fixtures for common test scenarios.
//!
//! A small project file and a matching `xcodebuild archive` log:
//!
//! - `App` (application) depends on `Core` through a container item proxy
//!   and on the `Alamofire` package product.
//! - `Core` (framework) has no dependencies.
//! - `All` (aggregate, no product) depends on `Core` directly.

/// `project.pbxproj` in the ASCII property list format Xcode writes.
pub const SAMPLE_PBXPROJ: &str = r#"// !$*UTF8*$!
{
	archiveVersion = 1;
	classes = {
	};
	objectVersion = 56;
	objects = {

/* Begin PBXBuildFile section */
		B1000001 /* AppDelegate.swift in Sources */ = {isa = PBXBuildFile; fileRef = F1000001 /* AppDelegate.swift */; };
/* End PBXBuildFile section */

/* Begin PBXContainerItemProxy section */
		C1000001 /* PBXContainerItemProxy */ = {
			isa = PBXContainerItemProxy;
			containerPortal = P0000001 /* Project object */;
			proxyType = 1;
			remoteGlobalIDString = T2000001;
			remoteInfo = Core;
		};
/* End PBXContainerItemProxy section */

/* Begin PBXFileReference section */
		F1000001 /* AppDelegate.swift */ = {isa = PBXFileReference; lastKnownFileType = sourcecode.swift; path = AppDelegate.swift; sourceTree = "<group>"; };
		F2000001 /* App.app */ = {isa = PBXFileReference; explicitFileType = wrapper.application; includeInIndex = 0; path = App.app; sourceTree = BUILT_PRODUCTS_DIR; };
		F3000001 /* Core.framework */ = {isa = PBXFileReference; explicitFileType = wrapper.framework; includeInIndex = 0; path = Core.framework; sourceTree = BUILT_PRODUCTS_DIR; };
/* End PBXFileReference section */

/* Begin PBXGroup section */
		G0000001 = {
			isa = PBXGroup;
			children = (
				F1000001 /* AppDelegate.swift */,
				G0000002 /* Products */,
			);
			sourceTree = "<group>";
		};
		G0000002 /* Products */ = {
			isa = PBXGroup;
			children = (
				F2000001 /* App.app */,
				F3000001 /* Core.framework */,
			);
			name = Products;
			sourceTree = "<group>";
		};
/* End PBXGroup section */

/* Begin PBXAggregateTarget section */
		T3000001 /* All */ = {
			isa = PBXAggregateTarget;
			buildConfigurationList = L2000001 /* Build configuration list for PBXAggregateTarget "All" */;
			buildPhases = (
			);
			dependencies = (
				D2000001 /* PBXTargetDependency */,
			);
			name = All;
			productName = All;
		};
/* End PBXAggregateTarget section */

/* Begin PBXNativeTarget section */
		T1000001 /* App */ = {
			isa = PBXNativeTarget;
			buildConfigurationList = L1000001 /* Build configuration list for PBXNativeTarget "App" */;
			buildPhases = (
				S1000001 /* Sources */,
			);
			buildRules = (
			);
			dependencies = (
				D1000001 /* PBXTargetDependency */,
			);
			name = App;
			packageProductDependencies = (
				K1000001 /* Alamofire */,
			);
			productName = App;
			productReference = F2000001 /* App.app */;
			productType = "com.apple.product-type.application";
		};
		T2000001 /* Core */ = {
			isa = PBXNativeTarget;
			buildPhases = (
			);
			buildRules = (
			);
			dependencies = (
			);
			name = Core;
			productName = Core;
			productReference = F3000001 /* Core.framework */;
			productType = "com.apple.product-type.framework";
		};
/* End PBXNativeTarget section */

/* Begin PBXProject section */
		P0000001 /* Project object */ = {
			isa = PBXProject;
			attributes = {
				BuildIndependentTargetsInParallel = 1;
				LastSwiftUpdateCheck = 1430;
			};
			compatibilityVersion = "Xcode 14.0";
			developmentRegion = en;
			hasScannedForEncodings = 0;
			knownRegions = (
				en,
				Base,
			);
			mainGroup = G0000001;
			productRefGroup = G0000002 /* Products */;
			projectDirPath = "";
			projectRoot = "";
			targets = (
				T1000001 /* App */,
				T2000001 /* Core */,
				T3000001 /* All */,
			);
		};
/* End PBXProject section */

/* Begin PBXSourcesBuildPhase section */
		S1000001 /* Sources */ = {
			isa = PBXSourcesBuildPhase;
			buildActionMask = 2147483647;
			files = (
				B1000001 /* AppDelegate.swift in Sources */,
			);
			runOnlyForDeploymentPostprocessing = 0;
		};
/* End PBXSourcesBuildPhase section */

/* Begin PBXTargetDependency section */
		D1000001 /* PBXTargetDependency */ = {
			isa = PBXTargetDependency;
			targetProxy = C1000001 /* PBXContainerItemProxy */;
		};
		D2000001 /* PBXTargetDependency */ = {
			isa = PBXTargetDependency;
			target = T2000001 /* Core */;
		};
/* End PBXTargetDependency section */

/* Begin XCBuildConfiguration section */
		X1000001 /* Release */ = {
			isa = XCBuildConfiguration;
			buildSettings = {
				PRODUCT_BUNDLE_IDENTIFIER = com.example.App;
				PRODUCT_NAME = "$(TARGET_NAME)";
				SWIFT_VERSION = 5.0;
			};
			name = Release;
		};
		X2000001 /* Release */ = {
			isa = XCBuildConfiguration;
			buildSettings = {
				PRODUCT_NAME = "$(TARGET_NAME)";
			};
			name = Release;
		};
/* End XCBuildConfiguration section */

/* Begin XCConfigurationList section */
		L1000001 /* Build configuration list for PBXNativeTarget "App" */ = {
			isa = XCConfigurationList;
			buildConfigurations = (
				X1000001 /* Release */,
			);
			defaultConfigurationIsVisible = 0;
			defaultConfigurationName = Release;
		};
		L2000001 /* Build configuration list for PBXAggregateTarget "All" */ = {
			isa = XCConfigurationList;
			buildConfigurations = (
				X2000001 /* Release */,
			);
			defaultConfigurationIsVisible = 0;
			defaultConfigurationName = Release;
		};
/* End XCConfigurationList section */

/* Begin XCRemoteSwiftPackageReference section */
		R1000001 /* XCRemoteSwiftPackageReference "Alamofire" */ = {
			isa = XCRemoteSwiftPackageReference;
			repositoryURL = "https://github.com/Alamofire/Alamofire.git";
			requirement = {
				kind = upToNextMajorVersion;
				minimumVersion = 5.8.0;
			};
		};
/* End XCRemoteSwiftPackageReference section */

/* Begin XCSwiftPackageProductDependency section */
		K1000001 /* Alamofire */ = {
			isa = XCSwiftPackageProductDependency;
			package = R1000001 /* XCRemoteSwiftPackageReference "Alamofire" */;
			productName = Alamofire;
		};
/* End XCSwiftPackageProductDependency section */
	};
	rootObject = P0000001 /* Project object */;
}
"#;

/// Excerpt of an `xcodebuild archive` log for [`SAMPLE_PBXPROJ`].
///
/// `Core` compiles one Objective-C file and one Swift module, `App` one
/// Swift module (split over continuation lines) and one Objective-C file.
/// The link step of `Core` is a clang run without `-c`.
pub const SAMPLE_BUILD_LOG: &str = r#"Command line invocation:
    /Applications/Xcode.app/Contents/Developer/usr/bin/xcodebuild archive -project Sample.xcodeproj -scheme App -archivePath /tmp/Sample.xcarchive

note: Using new build system
note: Building targets in dependency order

CompileC /Build/Core.build/Objects-normal/arm64/Utils.o /Source/Core/Utils.m normal arm64 objective-c com.apple.compilers.llvm.clang.1_0.compiler (in target 'Core' from project 'Sample')
    cd /Source
    /Toolchain/usr/bin/clang -x objective-c -target arm64-apple-ios16.0 -fmodules -MMD -MT dependencies -MF /Build/Core.build/Objects-normal/arm64/Utils.d --serialize-diagnostics /Build/Core.build/Objects-normal/arm64/Utils.dia -c /Source/Core/Utils.m -o /Build/Core.build/Objects-normal/arm64/Utils.o

SwiftDriver Core normal arm64 com.apple.xcode.tools.swift.compiler (in target 'Core' from project 'Sample')
    cd /Source
    builtin-SwiftDriver -- /Toolchain/usr/bin/swiftc -module-name Core -Onone -enable-batch-mode -c /Source/Core/Core.swift /Source/Core/Log.swift -output-file-map /Build/Core.build/Objects-normal/arm64/Core-OutputFileMap.json -emit-module -emit-module-path /Build/Core.build/Objects-normal/arm64/Core.swiftmodule

Ld /Build/Core.framework/Core normal (in target 'Core' from project 'Sample')
    cd /Source
    /Toolchain/usr/bin/clang -target arm64-apple-ios16.0 -dynamiclib -o /Build/Core.framework/Core

SwiftDriver App normal arm64 com.apple.xcode.tools.swift.compiler (in target 'App' from project 'Sample')
    cd /Source
    builtin-SwiftDriver -- /Toolchain/usr/bin/swiftc -module-name App -Onone \
        -c /Source/App/AppDelegate.swift \
        /Source/App/ContentView.swift -emit-module

CompileC /Build/App.build/Objects-normal/arm64/main.o /Source/App/main.m normal arm64 objective-c com.apple.compilers.llvm.clang.1_0.compiler (in target 'App' from project 'Sample')
    cd /Source
    /Toolchain/usr/bin/clang -x objective-c -target arm64-apple-ios16.0 -c /Source/App/main.m -o /Build/App.build/Objects-normal/arm64/main.o

** ARCHIVE SUCCEEDED **
"#;

/// A shell script standing in for a compiler.
///
/// Writes a line to the path following `-o`. Fails when an argument
/// contains `Broken`; an argument containing `Slow` makes it hang.
pub const FAKE_COMPILER_SCRIPT: &str = r#"#!/bin/sh
out=""
prev=""
for arg in "$@"; do
    case "$arg" in
        *Broken*) echo "error: cannot compile $arg" >&2; exit 1 ;;
        *Slow*) exec sleep 30 ;;
    esac
    if [ "$prev" = "-o" ]; then out="$arg"; fi
    prev="$arg"
done
if [ -z "$out" ]; then
    echo "error: no output file" >&2
    exit 2
fi
echo "; IR for $*" > "$out"
"#;
